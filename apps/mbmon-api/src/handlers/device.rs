//! 设备会话 handlers
//!
//! - POST /api/connect：按请求参数重建连接并开始轮询
//! - POST /api/disconnect：停止轮询并断开
//! - POST /api/write：写单个保持寄存器或线圈

use crate::AppState;
use crate::state::Session;
use crate::utils::response::{bad_request_error, device_error, ok};
use api_contract::{ConnectRequest, ConnectionDto, WriteRegisterRequest, WriteResultDto};
use axum::{Json, extract::State, response::Response};
use domain::{ConnectionParams, PollSettings, RegisterKind, TransportKind};
use tracing::{info, warn};

pub async fn connect(
    State(state): State<AppState>,
    Json(req): Json<ConnectRequest>,
) -> Response {
    let mut session = state.session.lock().await;
    let next = match merge_connect_request(&session, req) {
        Ok(next) => next,
        Err(message) => return bad_request_error(message),
    };
    let endpoint = next.connection.endpoint();

    state.poll.stop_and_wait().await;
    let connected = state.poll.connect(&next.connection).await;
    // 连接失败也启动轮询，每轮由采集器重连并累计错误计数
    if let Err(err) = state.poll.start(next.poll.clone()) {
        return bad_request_error(err.to_string());
    }
    *session = next;
    if !connected {
        warn!(endpoint = %endpoint, "connect failed, polling keeps retrying");
        return device_error(format!("failed to connect to {}", endpoint));
    }
    info!(endpoint = %endpoint, "device session started");

    ok(ConnectionDto {
        connected: true,
        polling: state.poll.is_running(),
        endpoint,
    })
}

pub async fn disconnect(State(state): State<AppState>) -> Response {
    let session = state.session.lock().await;
    state.poll.stop_and_wait().await;
    state.poll.disconnect().await;
    ok(ConnectionDto {
        connected: false,
        polling: false,
        endpoint: session.connection.endpoint(),
    })
}

pub async fn write_register(
    State(state): State<AppState>,
    Json(req): Json<WriteRegisterRequest>,
) -> Response {
    let kind = match req.register_type.parse::<RegisterKind>() {
        Ok(kind) if kind.is_writable() => kind,
        Ok(kind) => return bad_request_error(format!("{} is read-only", kind)),
        Err(message) => return bad_request_error(message),
    };
    if !state.poll.is_connected() {
        return device_error("not connected");
    }
    if !state.poll.write(kind, req.address, req.value).await {
        return device_error(format!("write to {} {} failed", kind, req.address));
    }
    ok(WriteResultDto { written: true })
}

/// 请求中未给出的字段沿用当前会话参数。
pub(crate) fn merge_connect_request(
    current: &Session,
    req: ConnectRequest,
) -> Result<Session, String> {
    let mut connection: ConnectionParams = current.connection.clone();
    if let Some(kind) = req.connection_type {
        connection.transport = kind.parse::<TransportKind>()?;
    }
    if let Some(host) = req.host {
        connection.host = host;
    }
    if let Some(port) = req.port {
        connection.port = port;
    }
    if let Some(timeout) = req.timeout {
        connection.timeout_secs = timeout;
    }
    if let Some(unit_id) = req.unit_id {
        connection.unit_id = unit_id;
    }
    if let Some(serial_port) = req.serial_port {
        connection.serial_port = serial_port;
    }
    if let Some(baud_rate) = req.baud_rate {
        connection.baud_rate = baud_rate;
    }
    connection.validate().map_err(|e| e.to_string())?;

    let mut poll: PollSettings = current.poll.clone();
    if let Some(start_address) = req.start_address {
        poll.start_address = start_address;
    }
    if let Some(count) = req.count {
        poll.count = count;
    }
    if let Some(register_type) = req.register_type {
        poll.register_type = register_type.parse()?;
    }
    if let Some(data_format) = req.data_format {
        poll.data_format = data_format.parse()?;
    }
    if let Some(interval) = req.interval {
        poll.interval_ms = interval;
    }
    poll.validate().map_err(|e| e.to_string())?;

    Ok(Session { connection, poll })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::build_state;
    use axum::http::StatusCode;
    use domain::DataFormat;
    use mbmon_config::AppConfig;
    use std::time::Duration;

    fn session() -> Session {
        Session {
            connection: ConnectionParams::default(),
            poll: PollSettings::default(),
        }
    }

    #[test]
    fn merge_keeps_unset_fields() {
        let req = ConnectRequest {
            host: Some("10.0.0.5".to_string()),
            data_format: Some("f32".to_string()),
            ..ConnectRequest::default()
        };
        let next = merge_connect_request(&session(), req).expect("merge");
        assert_eq!(next.connection.host, "10.0.0.5");
        assert_eq!(next.connection.port, 502);
        assert_eq!(next.poll.data_format, DataFormat::F32);
        assert_eq!(next.poll.count, 5);
    }

    #[test]
    fn merge_validates_settings() {
        let req = ConnectRequest {
            unit_id: Some(0),
            ..ConnectRequest::default()
        };
        assert!(merge_connect_request(&session(), req).is_err());

        let req = ConnectRequest {
            interval: Some(20),
            ..ConnectRequest::default()
        };
        assert!(merge_connect_request(&session(), req).is_err());

        let req = ConnectRequest {
            timeout: Some(0),
            ..ConnectRequest::default()
        };
        assert!(merge_connect_request(&session(), req).is_err());

        let req = ConnectRequest {
            connection_type: Some("udp".to_string()),
            ..ConnectRequest::default()
        };
        assert!(merge_connect_request(&session(), req).is_err());
    }

    #[tokio::test]
    async fn connect_to_unreachable_device_keeps_polling() {
        let config = AppConfig::from_lookup(|_| None).expect("config");
        let (state, _) = build_state(&config);
        let req = ConnectRequest {
            host: Some("127.0.0.1".to_string()),
            port: Some(1),
            timeout: Some(1),
            interval: Some(100),
            ..ConnectRequest::default()
        };
        let response = connect(State(state.clone()), Json(req)).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(state.poll.is_running());
        assert_eq!(state.session.lock().await.connection.port, 1);

        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        while state.poll.counters().error_count < 2 {
            assert!(tokio::time::Instant::now() < deadline, "error count did not grow");
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        let counters = state.poll.counters();
        assert_eq!(counters.read_count, 0);
        assert!(state.poll.latest().is_none());

        state.poll.stop_and_wait().await;
        assert!(!state.poll.is_running());
    }

    #[tokio::test]
    async fn write_rejects_read_only_space() {
        let config = AppConfig::from_lookup(|_| None).expect("config");
        let (state, _) = build_state(&config);
        let req = WriteRegisterRequest {
            register_type: "input".to_string(),
            address: 0,
            value: 1,
        };
        let response = write_register(State(state.clone()), Json(req)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let req = WriteRegisterRequest {
            register_type: "holding".to_string(),
            address: 0,
            value: 1,
        };
        let response = write_register(State(state), Json(req)).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
