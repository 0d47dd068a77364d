//! 应用共享状态与组件装配。

use domain::{ConnectionParams, PollSettings};
use mbmon_alerts::{AlertBroadcast, AlertEngine, LogSink};
use mbmon_config::AppConfig;
use mbmon_pipeline::{BroadcastSink, PollLoop, StoreSignalSink};
use mbmon_protocol::{DeviceLink, SignalAcquirer, SignalLabels};
use mbmon_storage::{
    AlertStore, EventStore, HistoryLimits, InMemoryHistoryStore, RetentionStore, SignalStore,
};
use mbmon_telemetry::component_span;
use std::sync::Arc;
use tokio::sync::Mutex;

/// 实时通道容量
const FEED_CAPACITY: usize = 64;

/// 当前会话使用的连接与轮询参数。
#[derive(Debug, Clone)]
pub struct Session {
    pub connection: ConnectionParams,
    pub poll: PollSettings,
}

#[derive(Clone)]
pub struct AppState {
    pub poll: Arc<PollLoop<DeviceLink>>,
    pub signal_store: Arc<dyn SignalStore>,
    pub alert_store: Arc<dyn AlertStore>,
    pub event_store: Arc<dyn EventStore>,
    pub signal_feed: Arc<BroadcastSink>,
    pub alert_feed: Arc<AlertBroadcast>,
    /// connect / disconnect 请求串行化
    pub session: Arc<Mutex<Session>>,
}

/// 按配置装配存储、告警引擎与轮询循环。轮询不在此启动。
pub fn build_state(config: &AppConfig) -> (AppState, Arc<dyn RetentionStore>) {
    let device = config.connection.endpoint();
    let history = Arc::new(InMemoryHistoryStore::with_limits(HistoryLimits {
        signals: config.history_capacity,
        ..HistoryLimits::default()
    }));
    let alert_feed = Arc::new(AlertBroadcast::new(FEED_CAPACITY));
    let signal_feed = Arc::new(BroadcastSink::new(FEED_CAPACITY));

    let mut engine = AlertEngine::new(component_span(&device, "alerts"))
        .with_max_history(config.alert_history)
        .with_store(history.clone())
        .with_sink(Arc::new(LogSink::new(component_span(&device, "notify"))))
        .with_sink(alert_feed.clone());
    for rule in &config.alert_rules {
        if let Err(e) = engine.add_rule(rule.clone()) {
            tracing::warn!(signal = %rule.signal_name, error = %e, "alert rule skipped");
        }
    }

    let acquirer = SignalAcquirer::new(
        DeviceLink::new(component_span(&device, "link")),
        component_span(&device, "acquirer"),
    )
    .with_policy(config.status_policy)
    .with_labels(SignalLabels::new(
        config.signal_names.clone(),
        config.signal_units.clone(),
    ));

    let poll = PollLoop::builder(acquirer, Arc::new(Mutex::new(engine)))
        .sink(signal_feed.clone())
        .sink(Arc::new(StoreSignalSink::new(history.clone())))
        .events(history.clone())
        .span(component_span(&device, "poll"))
        .build();

    let state = AppState {
        poll: Arc::new(poll),
        signal_store: history.clone(),
        alert_store: history.clone(),
        event_store: history.clone(),
        signal_feed,
        alert_feed,
        session: Arc::new(Mutex::new(Session {
            connection: config.connection.clone(),
            poll: config.poll.clone(),
        })),
    };
    (state, history)
}
