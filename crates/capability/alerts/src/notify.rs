//! 告警通知出口。

use crate::error::NotifyError;
use domain::AlertRecord;
use tokio::sync::broadcast;
use tracing::{Span, warn};

/// 告警通知能力：引擎在每条告警记录后调用。
pub trait NotifySink: Send + Sync {
    fn deliver(&self, record: &AlertRecord) -> Result<(), NotifyError>;
}

/// 以日志形式输出告警。
pub struct LogSink {
    span: Span,
}

impl LogSink {
    pub fn new(span: Span) -> Self {
        Self { span }
    }
}

impl NotifySink for LogSink {
    fn deliver(&self, record: &AlertRecord) -> Result<(), NotifyError> {
        warn!(
            parent: &self.span,
            signal = %record.signal_name,
            alert_type = %record.alert_type,
            severity = %record.severity,
            value = ?record.value,
            "ALERT [{}] {}",
            record.severity.as_str().to_ascii_uppercase(),
            record.message
        );
        Ok(())
    }
}

/// 通过 broadcast 通道推送告警给在线订阅者。
///
/// 没有订阅者时返回 `NoSubscribers`，引擎只记录 debug 日志。
#[derive(Clone)]
pub struct AlertBroadcast {
    sender: broadcast::Sender<AlertRecord>,
}

impl AlertBroadcast {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AlertRecord> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl NotifySink for AlertBroadcast {
    fn deliver(&self, record: &AlertRecord) -> Result<(), NotifyError> {
        self.sender
            .send(record.clone())
            .map(|_| ())
            .map_err(|_| NotifyError::NoSubscribers)
    }
}
