//! # 轮询管线
//!
//! `PollLoop` 在后台任务中按固定间隔驱动 `SignalAcquirer`，把每个成功批次
//! 依次交给告警引擎和各个 `SignalSink`（广播、历史存储）。
//!
//! 重试策略：固定间隔、无限次、无退避，直到 `stop`。

mod error;
mod poll;
mod sink;

pub use error::{PollError, SinkError};
pub use poll::{PollLoop, PollLoopBuilder};
pub use sink::{BroadcastSink, SignalSink, StoreSignalSink};
