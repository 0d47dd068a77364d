//! 告警 handlers
//!
//! - GET /api/alerts?hours=&severity=
//! - GET/POST/DELETE /api/alert-rules

use crate::AppState;
use crate::utils::response::{alert_to_dto, bad_request_error, ok, rule_to_dto, storage_error};
use api_contract::{
    AlertDto, AlertRuleDto, AlertsQuery, CreateAlertRuleRequest, DeleteAlertRuleRequest,
    RemovedDto,
};
use axum::{
    Json,
    extract::{Query, State},
    response::Response,
};
use domain::{AlertRule, AlertType, Severity};

/// 默认查询窗口（小时）
const DEFAULT_ALERT_HOURS: u32 = 24;

/// 已持久化的告警，最新在前
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> Response {
    let severity = match query.severity.as_deref().map(str::parse::<Severity>) {
        None => None,
        Some(Ok(severity)) => Some(severity),
        Some(Err(message)) => return bad_request_error(message),
    };
    let hours = query.hours.unwrap_or(DEFAULT_ALERT_HOURS);
    match state.alert_store.alerts(hours, severity).await {
        Ok(records) => ok(records.into_iter().map(alert_to_dto).collect::<Vec<AlertDto>>()),
        Err(err) => storage_error(err),
    }
}

pub async fn list_alert_rules(State(state): State<AppState>) -> Response {
    let rules = state.poll.alerts().lock().await.rules();
    ok(rules.into_iter().map(rule_to_dto).collect::<Vec<AlertRuleDto>>())
}

pub async fn create_alert_rule(
    State(state): State<AppState>,
    Json(req): Json<CreateAlertRuleRequest>,
) -> Response {
    let rule = match parse_rule(req) {
        Ok(rule) => rule,
        Err(message) => return bad_request_error(message),
    };
    let alerts = state.poll.alerts();
    let mut engine = alerts.lock().await;
    match engine.add_rule(rule.clone()) {
        Ok(()) => ok(rule_to_dto(rule)),
        Err(err) => bad_request_error(err.to_string()),
    }
}

pub async fn delete_alert_rule(
    State(state): State<AppState>,
    Json(req): Json<DeleteAlertRuleRequest>,
) -> Response {
    let alert_type = match req.alert_type.parse::<AlertType>() {
        Ok(alert_type) => alert_type,
        Err(message) => return bad_request_error(message),
    };
    let removed = state
        .poll
        .alerts()
        .lock()
        .await
        .remove_rule(&req.signal_name, alert_type);
    ok(RemovedDto { removed })
}

fn parse_rule(req: CreateAlertRuleRequest) -> Result<AlertRule, String> {
    let signal_name = req.signal_name.trim();
    if signal_name.is_empty() {
        return Err("signalName is required".to_string());
    }
    let alert_type = req.alert_type.parse::<AlertType>()?;
    let severity = match req.severity.as_deref() {
        Some(value) => value.parse::<Severity>()?,
        None => Severity::default(),
    };
    if matches!(alert_type, AlertType::ThresholdHigh | AlertType::ThresholdLow)
        && req.threshold.is_some_and(|threshold| !threshold.is_finite())
    {
        return Err("threshold must be finite".to_string());
    }
    let mut rule = AlertRule::new(signal_name, alert_type, req.threshold, severity);
    rule.enabled = req.enabled.unwrap_or(true);
    Ok(rule)
}
