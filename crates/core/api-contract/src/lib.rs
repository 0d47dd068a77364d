//! 稳定的 DTO 与 API 响应契约。

use serde::{Deserialize, Serialize};

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 单个信号。`value` 为数字或布尔值。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalDto {
    pub id: usize,
    pub address: u16,
    pub name: String,
    pub value: serde_json::Value,
    pub unit: String,
    pub status: String,
    pub last_update_ms: i64,
}

/// 告警记录。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDto {
    pub signal_name: String,
    pub alert_type: String,
    pub message: String,
    pub severity: String,
    pub value: Option<f64>,
    pub timestamp_ms: i64,
}

/// 运行状态。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDto {
    pub connected: bool,
    pub polling: bool,
    pub endpoint: Option<String>,
    pub signals: Vec<SignalDto>,
    pub read_count: u64,
    pub error_count: u64,
    pub last_update_ms: Option<i64>,
    pub alerts: Vec<AlertDto>,
}

/// 信号历史点。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalHistoryDto {
    pub signal_name: String,
    pub address: u16,
    pub value: serde_json::Value,
    pub unit: String,
    pub status: String,
    pub timestamp_ms: i64,
}

/// 系统事件。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDto {
    pub kind: String,
    pub message: String,
    pub timestamp_ms: i64,
}

/// 告警规则。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRuleDto {
    pub signal_name: String,
    pub alert_type: String,
    pub threshold: Option<f64>,
    pub enabled: bool,
    pub severity: String,
}

/// 告警查询参数。
#[derive(Debug, Default, Deserialize)]
pub struct AlertsQuery {
    pub hours: Option<u32>,
    pub severity: Option<String>,
}

/// 信号历史查询参数。
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub minutes: Option<u32>,
}

/// 事件查询参数。
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    pub hours: Option<u32>,
}

/// 新增告警规则请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRuleRequest {
    #[serde(alias = "signal_name")]
    pub signal_name: String,
    #[serde(alias = "alert_type")]
    pub alert_type: String,
    pub threshold: Option<f64>,
    pub enabled: Option<bool>,
    pub severity: Option<String>,
}

/// 删除告警规则请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAlertRuleRequest {
    #[serde(alias = "signal_name")]
    pub signal_name: String,
    #[serde(alias = "alert_type")]
    pub alert_type: String,
}

/// 删除告警规则结果。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedDto {
    pub removed: usize,
}

/// 连接并开始轮询的请求体；未给出的字段取运行配置中的值。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    pub connection_type: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub timeout: Option<u64>,
    pub unit_id: Option<u8>,
    pub serial_port: Option<String>,
    pub baud_rate: Option<u32>,
    pub start_address: Option<u16>,
    pub count: Option<u16>,
    pub register_type: Option<String>,
    pub data_format: Option<String>,
    pub interval: Option<u64>,
}

/// 连接结果。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDto {
    pub connected: bool,
    pub polling: bool,
    pub endpoint: String,
}

/// 单寄存器写请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteRegisterRequest {
    pub register_type: String,
    pub address: u16,
    pub value: u16,
}

/// 写结果。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResultDto {
    pub written: bool,
}

/// 实时推送的信号批次。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalsUpdateDto {
    pub signals: Vec<SignalDto>,
    pub read_count: u64,
    pub error_count: u64,
}
