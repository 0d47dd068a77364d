//! 状态 handlers
//!
//! - GET /health
//! - GET /api/status
//! - GET /api/stream（SSE：signals / alert 两类事件）

use crate::AppState;
use crate::utils::response::{alert_to_dto, ok, signal_to_dto};
use api_contract::{SignalsUpdateDto, StatusDto};
use axum::{
    Json,
    extract::State,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use domain::{AlertRecord, SignalBatch};
use futures::stream::{self, Stream};
use mbmon_pipeline::PollLoop;
use mbmon_protocol::DeviceLink;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

/// 当前连接状态、最近一批信号、计数器与最近告警
pub async fn get_status(State(state): State<AppState>) -> Response {
    let counters = state.poll.counters();
    let signals = state
        .poll
        .latest()
        .map(|batch| batch.signals.iter().map(signal_to_dto).collect())
        .unwrap_or_default();
    let alerts = state
        .poll
        .alerts()
        .lock()
        .await
        .get_active_alerts()
        .into_iter()
        .map(alert_to_dto)
        .collect();
    let endpoint = state.session.lock().await.connection.endpoint();

    ok(StatusDto {
        connected: state.poll.is_connected(),
        polling: state.poll.is_running(),
        endpoint: Some(endpoint),
        signals,
        read_count: counters.read_count,
        error_count: counters.error_count,
        last_update_ms: counters.last_success_ms,
        alerts,
    })
}

/// 实时推送；落后的订阅者跳过积压数据。
pub async fn stream_updates(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let signals = state.signal_feed.subscribe();
    let alerts = state.alert_feed.subscribe();
    let poll = state.poll.clone();

    let stream = stream::unfold(
        (signals, alerts, poll),
        |(mut signals, mut alerts, poll)| async move {
            loop {
                let event = tokio::select! {
                    batch = signals.recv() => match batch {
                        Ok(batch) => batch_event(&batch, &poll),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => return None,
                    },
                    alert = alerts.recv() => match alert {
                        Ok(alert) => alert_event(alert),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => return None,
                    },
                };
                return Some((Ok(event), (signals, alerts, poll)));
            }
        },
    );

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn batch_event(batch: &SignalBatch, poll: &Arc<PollLoop<DeviceLink>>) -> Event {
    let counters = poll.counters();
    let update = SignalsUpdateDto {
        signals: batch.signals.iter().map(signal_to_dto).collect(),
        read_count: counters.read_count,
        error_count: counters.error_count,
    };
    Event::default()
        .event("signals")
        .json_data(update)
        .unwrap_or_else(|_| Event::default().comment("unserializable signals"))
}

fn alert_event(alert: AlertRecord) -> Event {
    Event::default()
        .event("alert")
        .json_data(alert_to_dto(alert))
        .unwrap_or_else(|_| Event::default().comment("unserializable alert"))
}
