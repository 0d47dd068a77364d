use domain::AlertType;

/// 规则管理错误。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlertError {
    #[error("alert type {0} has no evaluation logic")]
    Unsupported(AlertType),
}

/// 通知投递错误。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NotifyError {
    #[error("no subscribers")]
    NoSubscribers,
    #[error("delivery failed: {0}")]
    Delivery(String),
}
