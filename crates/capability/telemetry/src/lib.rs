//! 追踪初始化、组件 span 与轮询计数。

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use tracing::Span;
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 轮询计数快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollCounters {
    pub read_count: u64,
    pub error_count: u64,
    /// 最近一次成功读取时间（毫秒），从未成功为 None
    pub last_success_ms: Option<i64>,
}

/// 单个轮询循环的计数器。
///
/// 只由轮询任务写入，其他任务通过 `snapshot` 读取，Relaxed 即可。
#[derive(Debug)]
pub struct PollMetrics {
    read_count: AtomicU64,
    error_count: AtomicU64,
    last_success_ms: AtomicI64,
}

const NEVER: i64 = i64::MIN;

impl PollMetrics {
    pub fn new() -> Self {
        Self {
            read_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            last_success_ms: AtomicI64::new(NEVER),
        }
    }

    /// 记录一次成功读取。
    pub fn record_read(&self, at_ms: i64) {
        self.read_count.fetch_add(1, Ordering::Relaxed);
        self.last_success_ms.store(at_ms, Ordering::Relaxed);
    }

    /// 记录一次失败迭代。
    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PollCounters {
        let last = self.last_success_ms.load(Ordering::Relaxed);
        PollCounters {
            read_count: self.read_count.load(Ordering::Relaxed),
            error_count: self.error_count.load(Ordering::Relaxed),
            last_success_ms: (last != NEVER).then_some(last),
        }
    }
}

impl Default for PollMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 为组件创建日志 span，构造组件时注入，组件内日志都挂在该 span 下。
pub fn component_span(device: &str, component: &'static str) -> Span {
    tracing::info_span!("mbmon", device = %device, component)
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}
