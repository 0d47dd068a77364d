//! 历史查询 handlers
//!
//! - GET /api/history/:signal_name?minutes=
//! - GET /api/events?hours=

use crate::AppState;
use crate::utils::response::{event_to_dto, history_to_dto, ok, storage_error};
use api_contract::{EventDto, EventsQuery, HistoryQuery, SignalHistoryDto};
use axum::{
    extract::{Path, Query, State},
    response::Response,
};

const DEFAULT_HISTORY_MINUTES: u32 = 60;
const DEFAULT_EVENT_HOURS: u32 = 24;

/// 单个信号的历史值，按时间升序
pub async fn signal_history(
    State(state): State<AppState>,
    Path(signal_name): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let minutes = query.minutes.unwrap_or(DEFAULT_HISTORY_MINUTES);
    match state.signal_store.signal_history(&signal_name, minutes).await {
        Ok(records) => ok(records
            .into_iter()
            .map(history_to_dto)
            .collect::<Vec<SignalHistoryDto>>()),
        Err(err) => storage_error(err),
    }
}

pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Response {
    let hours = query.hours.unwrap_or(DEFAULT_EVENT_HOURS);
    match state.event_store.events(hours).await {
        Ok(records) => ok(records.into_iter().map(event_to_dto).collect::<Vec<EventDto>>()),
        Err(err) => storage_error(err),
    }
}
