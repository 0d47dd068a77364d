//! 领域模型：信号、寄存器空间、告警规则与轮询参数。
//!
//! 所有能力模块共享这些类型，本 crate 不包含任何 I/O。

pub mod alert;
pub mod data;
pub mod settings;

pub use alert::{AlertRecord, AlertRule, AlertType, Severity};
pub use data::{
    DataFormat, RegisterKind, Signal, SignalBatch, SignalStatus, SignalValue, StatusPolicy,
    now_epoch_ms,
};
pub use settings::{
    ConnectionParams, MAX_BITS_PER_READ, MAX_REGISTERS_PER_READ, MIN_INTERVAL_MS, PollSettings,
    SettingsError, TransportKind, physical_count,
};
