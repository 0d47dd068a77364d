//! 内存存储实现模块
//!
//! 仅用于本地运行和测试。
//!
//! - SignalStore / AlertStore / EventStore / RetentionStore: InMemoryHistoryStore

pub mod history;

pub use history::*;
