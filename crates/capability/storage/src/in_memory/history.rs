//! 历史数据内存实现

use crate::error::StorageError;
use crate::models::{EventRecord, SignalRecord};
use crate::traits::{
    AlertStore, EVENT_LIMIT, EventStore, RetentionStore, SIGNAL_HISTORY_LIMIT, SignalStore,
};
use domain::{AlertRecord, Severity, Signal, now_epoch_ms};
use std::collections::VecDeque;
use std::sync::RwLock;

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// 各集合的最大条数；超出后丢弃最旧的记录。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLimits {
    pub signals: usize,
    pub alerts: usize,
    pub events: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            signals: 100_000,
            alerts: 10_000,
            events: 10_000,
        }
    }
}

/// 信号、告警、事件的内存存储，每个集合按 [`HistoryLimits`] 封顶
pub struct InMemoryHistoryStore {
    signals: RwLock<VecDeque<SignalRecord>>,
    alerts: RwLock<VecDeque<AlertRecord>>,
    events: RwLock<VecDeque<EventRecord>>,
    limits: HistoryLimits,
}

/// 追加后从头部丢弃超出上限的部分。
fn push_bounded<T>(items: &mut VecDeque<T>, limit: usize, new: impl IntoIterator<Item = T>) {
    items.extend(new);
    let excess = items.len().saturating_sub(limit);
    items.drain(..excess);
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::with_limits(HistoryLimits::default())
    }

    pub fn with_limits(limits: HistoryLimits) -> Self {
        Self {
            signals: RwLock::new(VecDeque::new()),
            alerts: RwLock::new(VecDeque::new()),
            events: RwLock::new(VecDeque::new()),
            limits,
        }
    }

    pub fn limits(&self) -> HistoryLimits {
        self.limits
    }

    /// 当前保存的信号记录数（用于测试）
    pub fn signal_count(&self) -> usize {
        self.signals.read().map(|v| v.len()).unwrap_or(0)
    }

    /// 当前保存的告警数（用于测试）
    pub fn alert_count(&self) -> usize {
        self.alerts.read().map(|v| v.len()).unwrap_or(0)
    }

    pub fn event_count(&self) -> usize {
        self.events.read().map(|v| v.len()).unwrap_or(0)
    }

    /// 直接写入一条带时间戳的信号记录。
    pub fn insert_signal_record(&self, record: SignalRecord) -> Result<(), StorageError> {
        let mut signals = self
            .signals
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        push_bounded(&mut signals, self.limits.signals, [record]);
        Ok(())
    }
}

impl Default for InMemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SignalStore for InMemoryHistoryStore {
    async fn save_signals(&self, signals: &[Signal]) -> Result<usize, StorageError> {
        let mut store = self
            .signals
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        push_bounded(
            &mut store,
            self.limits.signals,
            signals.iter().map(SignalRecord::from),
        );
        Ok(signals.len())
    }

    async fn signal_history(
        &self,
        signal_name: &str,
        minutes: u32,
    ) -> Result<Vec<SignalRecord>, StorageError> {
        let since = now_epoch_ms() - i64::from(minutes) * MINUTE_MS;
        let signals = self
            .signals
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut selected: Vec<SignalRecord> = signals
            .iter()
            .filter(|record| record.signal_name == signal_name && record.timestamp_ms > since)
            .cloned()
            .collect();

        // 保留最新的 N 条，再按时间升序返回
        selected.sort_by_key(|record| std::cmp::Reverse(record.timestamp_ms));
        selected.truncate(SIGNAL_HISTORY_LIMIT);
        selected.reverse();
        Ok(selected)
    }
}

#[async_trait::async_trait]
impl AlertStore for InMemoryHistoryStore {
    async fn save_alert(&self, record: &AlertRecord) -> Result<(), StorageError> {
        let mut alerts = self
            .alerts
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        push_bounded(&mut alerts, self.limits.alerts, [record.clone()]);
        Ok(())
    }

    async fn alerts(
        &self,
        hours: u32,
        severity: Option<Severity>,
    ) -> Result<Vec<AlertRecord>, StorageError> {
        let since = now_epoch_ms() - i64::from(hours) * HOUR_MS;
        let alerts = self
            .alerts
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut selected: Vec<AlertRecord> = alerts
            .iter()
            .filter(|record| record.timestamp_ms > since)
            .filter(|record| severity.is_none_or(|s| record.severity == s))
            .cloned()
            .collect();
        selected.sort_by_key(|record| std::cmp::Reverse(record.timestamp_ms));
        Ok(selected)
    }
}

#[async_trait::async_trait]
impl EventStore for InMemoryHistoryStore {
    async fn save_event(&self, event: &EventRecord) -> Result<(), StorageError> {
        let mut events = self
            .events
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        push_bounded(&mut events, self.limits.events, [event.clone()]);
        Ok(())
    }

    async fn events(&self, hours: u32) -> Result<Vec<EventRecord>, StorageError> {
        let since = now_epoch_ms() - i64::from(hours) * HOUR_MS;
        let events = self
            .events
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut selected: Vec<EventRecord> = events
            .iter()
            .filter(|event| event.timestamp_ms > since)
            .cloned()
            .collect();
        selected.sort_by_key(|event| std::cmp::Reverse(event.timestamp_ms));
        selected.truncate(EVENT_LIMIT);
        Ok(selected)
    }
}

#[async_trait::async_trait]
impl RetentionStore for InMemoryHistoryStore {
    async fn cleanup_older_than(&self, days: u32) -> Result<usize, StorageError> {
        let cutoff = now_epoch_ms() - i64::from(days) * DAY_MS;
        let mut removed = 0;
        {
            let mut signals = self
                .signals
                .write()
                .map_err(|_| StorageError::new("lock failed"))?;
            let before = signals.len();
            signals.retain(|record| record.timestamp_ms >= cutoff);
            removed += before - signals.len();
        }
        {
            let mut alerts = self
                .alerts
                .write()
                .map_err(|_| StorageError::new("lock failed"))?;
            let before = alerts.len();
            alerts.retain(|record| record.timestamp_ms >= cutoff);
            removed += before - alerts.len();
        }
        let mut events = self
            .events
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let before = events.len();
        events.retain(|event| event.timestamp_ms >= cutoff);
        removed += before - events.len();
        Ok(removed)
    }
}
