//! HTTP 响应辅助函数和 DTO 转换
//!
//! - 错误响应：bad_request_error, device_error, storage_error
//! - DTO 转换：signal_to_dto, alert_to_dto, rule_to_dto, history_to_dto, event_to_dto

use api_contract::{AlertDto, AlertRuleDto, ApiResponse, EventDto, SignalDto, SignalHistoryDto};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::{AlertRecord, AlertRule, Signal, SignalValue};
use mbmon_storage::{EventRecord, SignalRecord, StorageError};
use serde_json::{Number, Value};

/// 成功响应
pub fn ok<T: serde::Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
}

/// 错误请求响应
pub fn bad_request_error(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error("INVALID.REQUEST", message.into())),
    )
        .into_response()
}

/// 设备不可达或操作失败
pub fn device_error(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(ApiResponse::<()>::error("DEVICE.UNAVAILABLE", message.into())),
    )
        .into_response()
}

/// 存储错误响应
pub fn storage_error(err: StorageError) -> Response {
    let message = err.to_string();
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::error("INTERNAL.ERROR", message)),
    )
        .into_response()
}

/// 非有限浮点数输出为 null。
pub fn value_to_json(value: SignalValue) -> Value {
    match value {
        SignalValue::Bool(v) => Value::Bool(v),
        SignalValue::Int(v) => Value::Number(Number::from(v)),
        SignalValue::Float(v) => Number::from_f64(v).map_or(Value::Null, Value::Number),
    }
}

pub fn signal_to_dto(signal: &Signal) -> SignalDto {
    SignalDto {
        id: signal.id,
        address: signal.address,
        name: signal.name.clone(),
        value: value_to_json(signal.value),
        unit: signal.unit.clone(),
        status: signal.status.as_str().to_string(),
        last_update_ms: signal.last_update_ms,
    }
}

pub fn alert_to_dto(record: AlertRecord) -> AlertDto {
    AlertDto {
        signal_name: record.signal_name,
        alert_type: record.alert_type.as_str().to_string(),
        message: record.message,
        severity: record.severity.as_str().to_string(),
        value: record.value,
        timestamp_ms: record.timestamp_ms,
    }
}

pub fn rule_to_dto(rule: AlertRule) -> AlertRuleDto {
    AlertRuleDto {
        signal_name: rule.signal_name,
        alert_type: rule.alert_type.as_str().to_string(),
        threshold: rule.threshold,
        enabled: rule.enabled,
        severity: rule.severity.as_str().to_string(),
    }
}

pub fn history_to_dto(record: SignalRecord) -> SignalHistoryDto {
    SignalHistoryDto {
        signal_name: record.signal_name,
        address: record.address,
        value: value_to_json(record.value),
        unit: record.unit,
        status: record.status.as_str().to_string(),
        timestamp_ms: record.timestamp_ms,
    }
}

pub fn event_to_dto(record: EventRecord) -> EventDto {
    EventDto {
        kind: record.kind.as_str().to_string(),
        message: record.message,
        timestamp_ms: record.timestamp_ms,
    }
}
