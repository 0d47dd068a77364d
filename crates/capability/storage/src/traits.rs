//! 存储接口 Trait 定义
//!
//! - SignalStore：信号历史
//! - AlertStore：告警记录
//! - EventStore：系统事件
//! - RetentionStore：过期数据清理
//!
//! 查询窗口都以当前时间为终点。

use crate::error::StorageError;
use crate::models::{EventRecord, SignalRecord};
use async_trait::async_trait;
use domain::{AlertRecord, Severity, Signal};

/// 单次信号历史查询的最大条数
pub const SIGNAL_HISTORY_LIMIT: usize = 500;
/// 单次事件查询的最大条数
pub const EVENT_LIMIT: usize = 100;

/// 信号历史存储接口
#[async_trait]
pub trait SignalStore: Send + Sync {
    /// 保存一批信号，返回写入条数
    async fn save_signals(&self, signals: &[Signal]) -> Result<usize, StorageError>;

    /// 最近 `minutes` 分钟内某信号的历史，取最新的 500 条，按时间升序返回
    async fn signal_history(
        &self,
        signal_name: &str,
        minutes: u32,
    ) -> Result<Vec<SignalRecord>, StorageError>;
}

/// 告警存储接口
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn save_alert(&self, record: &AlertRecord) -> Result<(), StorageError>;

    /// 最近 `hours` 小时内的告警，可按级别过滤，按时间降序返回
    async fn alerts(
        &self,
        hours: u32,
        severity: Option<Severity>,
    ) -> Result<Vec<AlertRecord>, StorageError>;
}

/// 系统事件存储接口
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn save_event(&self, event: &EventRecord) -> Result<(), StorageError>;

    /// 最近 `hours` 小时内的事件，最多 100 条，按时间降序返回
    async fn events(&self, hours: u32) -> Result<Vec<EventRecord>, StorageError>;
}

/// 过期数据清理
#[async_trait]
pub trait RetentionStore: Send + Sync {
    /// 删除早于 `days` 天的信号、告警与事件，返回删除条数
    async fn cleanup_older_than(&self, days: u32) -> Result<usize, StorageError>;
}
