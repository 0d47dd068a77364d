//! # 告警能力模块
//!
//! - [`AlertEngine`]：按信号名维护规则表，判定阈值/连接丢失规则，
//!   维护有界告警历史（默认 1000 条，先进先出）
//! - [`NotifySink`]：告警通知出口，内置 [`LogSink`] 与 [`AlertBroadcast`]
//!
//! 持久化通过 `mbmon_storage::AlertStore` 注入，失败只记录日志，不影响通知。

mod engine;
mod error;
mod notify;

pub use engine::{ACTIVE_ALERT_COUNT, AlertEngine, DEFAULT_MAX_HISTORY};
pub use error::{AlertError, NotifyError};
pub use notify::{AlertBroadcast, LogSink, NotifySink};
