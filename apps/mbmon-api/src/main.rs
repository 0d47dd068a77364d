//! Modbus 寄存器监控：采集、告警与 JSON 状态接口。

mod handlers;
mod middleware;
mod routes;
mod state;
mod utils;

use mbmon_config::AppConfig;
use mbmon_storage::RetentionStore;
use mbmon_telemetry::{component_span, init_tracing};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Span, info, warn};

pub use state::AppState;

/// 历史清理周期
const RETENTION_PERIOD: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    let (state, history) = state::build_state(&config);
    let device = config.connection.endpoint();

    spawn_retention(
        history,
        config.retention_days,
        component_span(&device, "retention"),
    );

    // 启动即连接；失败时轮询照常启动，每轮重连
    if !state.poll.connect(&config.connection).await {
        warn!(endpoint = %device, "initial connect failed, polling will retry");
    }
    state.poll.start(config.poll.clone())?;

    let app = routes::create_router(state.clone());
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(addr = %config.http_addr, "http server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.poll.stop_and_wait().await;
    state.poll.disconnect().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
}

/// 周期性删除超过保留天数的信号与告警。
fn spawn_retention(store: Arc<dyn RetentionStore>, days: u32, span: Span) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(RETENTION_PERIOD);
        loop {
            ticker.tick().await;
            match store.cleanup_older_than(days).await {
                Ok(0) => {}
                Ok(removed) => info!(parent: &span, removed, days, "history cleaned up"),
                Err(e) => warn!(parent: &span, error = %e, "history cleanup failed"),
            }
        }
    });
}
