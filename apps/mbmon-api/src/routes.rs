//! 路由定义
//!
//! - 健康检查：/health
//! - 状态与实时推送：/api/status, /api/stream
//! - 历史查询：/api/alerts, /api/history/:signal_name, /api/events
//! - 告警规则：/api/alert-rules
//! - 设备会话：/api/connect, /api/disconnect, /api/write

use super::AppState;
use super::handlers::*;
use super::middleware::request_context;
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// 创建 API 路由
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/status", get(get_status))
        .route("/stream", get(stream_updates))
        .route("/alerts", get(list_alerts))
        .route("/history/:signal_name", get(signal_history))
        .route("/events", get(list_events))
        .route(
            "/alert-rules",
            get(list_alert_rules)
                .post(create_alert_rule)
                .delete(delete_alert_rule),
        )
        .route("/connect", post(connect))
        .route("/disconnect", post(disconnect))
        .route("/write", post(write_register))
}

/// 完整应用路由：/health + /api/*，所有响应带追踪 ID。
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", create_api_router())
        .with_state(state)
        .layer(middleware::from_fn(request_context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::build_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use mbmon_config::AppConfig;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let config = AppConfig::from_lookup(|_| None).expect("config");
        let (state, _) = build_state(&config);
        create_router(state)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn health_has_trace_headers() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert!(response.headers().contains_key("x-trace-id"));
    }

    #[tokio::test]
    async fn status_before_connect() {
        let response = app()
            .oneshot(Request::get("/api/status").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["connected"], false);
        assert_eq!(value["data"]["polling"], false);
        assert_eq!(value["data"]["readCount"], 0);
        assert_eq!(value["data"]["signals"], Value::Array(Vec::new()));
    }

    #[tokio::test]
    async fn alert_rule_lifecycle() {
        let app = app();
        let create = Request::post("/api/alert-rules")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"signalName":"Signal 1","alertType":"threshold_high","threshold":50,"severity":"critical"}"#,
            ))
            .expect("request");
        let response = app.clone().oneshot(create).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let list = Request::get("/api/alert-rules")
            .body(Body::empty())
            .expect("request");
        let value = body_json(app.clone().oneshot(list).await.expect("response")).await;
        assert_eq!(value["data"][0]["signalName"], "Signal 1");
        assert_eq!(value["data"][0]["severity"], "critical");

        let delete = Request::delete("/api/alert-rules")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"signal_name":"Signal 1","alert_type":"threshold_high"}"#,
            ))
            .expect("request");
        let value = body_json(app.oneshot(delete).await.expect("response")).await;
        assert_eq!(value["data"]["removed"], 1);
    }

    #[tokio::test]
    async fn unknown_history_is_empty() {
        let response = app()
            .oneshot(
                Request::get("/api/history/Signal%209?minutes=5")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        assert_eq!(value["data"], Value::Array(Vec::new()));
    }
}
