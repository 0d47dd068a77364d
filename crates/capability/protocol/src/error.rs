//! 协议错误类型定义

use domain::RegisterKind;

/// 协议通信错误
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// 连接错误
    #[error("connection error: {0}")]
    Connection(String),

    /// 未连接
    #[error("not connected")]
    NotConnected,

    /// IO 错误
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Modbus 异常响应
    #[error("modbus exception: {0}")]
    Exception(String),

    /// Modbus 错误
    #[error("modbus error: {0}")]
    Modbus(String),

    /// 寄存器类型不支持该操作
    #[error("unsupported register kind for {op}: {kind}")]
    UnsupportedKind { op: &'static str, kind: RegisterKind },

    /// 配置参数错误
    #[error("invalid settings: {0}")]
    Settings(#[from] domain::SettingsError),

    /// 数据解析错误
    #[error("data parse error: {0}")]
    DataParse(String),

    /// 超时错误
    #[error("timeout: {0}")]
    Timeout(String),
}

impl From<tokio_modbus::Error> for ProtocolError {
    fn from(err: tokio_modbus::Error) -> Self {
        ProtocolError::Modbus(err.to_string())
    }
}
