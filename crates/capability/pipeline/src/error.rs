/// 轮询控制错误。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PollError {
    #[error("poll loop already running")]
    AlreadyRunning,
    #[error("invalid poll settings: {0}")]
    Settings(#[from] domain::SettingsError),
}

/// 信号下游写入错误。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SinkError {
    #[error("no subscribers")]
    NoSubscribers,
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<mbmon_storage::StorageError> for SinkError {
    fn from(err: mbmon_storage::StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}
