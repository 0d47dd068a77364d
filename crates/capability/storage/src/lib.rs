//! # mbmon Storage 模块
//!
//! 信号历史、告警与系统事件的存储抽象。
//!
//! ## 模块说明
//!
//! - [`traits`]：`SignalStore` / `AlertStore` / `EventStore` / `RetentionStore`
//! - [`models`]：`SignalRecord`、`EventRecord`
//! - [`error`]：`StorageError`
//! - [`in_memory`]：`InMemoryHistoryStore`，使用 `RwLock<VecDeque<_>>`，按 `HistoryLimits` 封顶
//!
//! ## 查询约定
//!
//! - 信号历史：时间窗口内最新 500 条，按时间升序
//! - 告警：时间窗口内全部，可按级别过滤，按时间降序
//! - 事件：时间窗口内最新 100 条，按时间降序
//! - 清理：删除早于 N 天的信号、告警与事件
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use mbmon_storage::{InMemoryHistoryStore, SignalStore};
//!
//! let store = InMemoryHistoryStore::new();
//! store.save_signals(&batch.signals).await?;
//! let history = store.signal_history("Signal 1", 60).await?;
//! ```

pub mod error;
pub mod in_memory;
pub mod models;
pub mod traits;

pub use error::*;
pub use in_memory::{HistoryLimits, InMemoryHistoryStore};
pub use models::*;
pub use traits::*;
