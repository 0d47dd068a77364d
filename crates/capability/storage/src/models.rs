//! 数据模型
//!
//! - 信号历史：SignalRecord
//! - 系统事件：EventRecord, EventKind
//!
//! 告警直接保存 `domain::AlertRecord`。

use domain::{Signal, SignalStatus, SignalValue};
use serde::{Deserialize, Serialize};

/// 信号历史记录（一次轮询中的一个信号）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalRecord {
    pub signal_name: String,
    pub address: u16,
    pub value: SignalValue,
    pub unit: String,
    pub status: SignalStatus,
    pub timestamp_ms: i64,
}

impl From<&Signal> for SignalRecord {
    fn from(signal: &Signal) -> Self {
        Self {
            signal_name: signal.name.clone(),
            address: signal.address,
            value: signal.value,
            unit: signal.unit.clone(),
            status: signal.status,
            timestamp_ms: signal.last_update_ms,
        }
    }
}

/// 系统事件类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Connect,
    Disconnect,
    PollStart,
    PollStop,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::PollStart => "poll_start",
            Self::PollStop => "poll_stop",
        }
    }
}

/// 系统事件记录。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub kind: EventKind,
    pub message: String,
    pub timestamp_ms: i64,
}

impl EventRecord {
    pub fn now(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp_ms: domain::now_epoch_ms(),
        }
    }
}
