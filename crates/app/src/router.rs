use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chat_dispatch_core::{health, Dispatcher, HealthStatus};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::{chat, telemetry};

#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(metrics: PrometheusHandle, dispatcher: Dispatcher) -> Self {
        Self {
            metrics,
            dispatcher,
        }
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat::handle))
        .route("/health", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

async fn healthz() -> Json<HealthStatus> {
    Json(health::report())
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = telemetry::render_metrics(state.metrics(), state.dispatcher().registry());
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chat_dispatch_core::DomainRegistry;
    use chat_dispatch_downstream::DownstreamClient;
    use http_body_util::BodyExt;
    use httpmock::prelude::*;
    use serde_json::{json, Value};
    use std::{sync::Arc, time::Duration};
    use tower::ServiceExt;

    fn state_for(routes: &[(&str, String)], timeout: Duration) -> AppState {
        let metrics = telemetry::init_metrics().expect("metrics init");
        let registry = DomainRegistry::from_routes(
            routes
                .iter()
                .map(|(domain, endpoint)| (domain.to_string(), endpoint.as_str())),
        )
        .expect("registry");
        let client = DownstreamClient::new(timeout).expect("client");
        AppState::new(metrics, Dispatcher::new(registry, Arc::new(client)))
    }

    fn state_with_psych(server: &MockServer) -> AppState {
        state_for(
            &[
                ("psych", server.url("/psych")),
                ("legal", server.url("/legal")),
            ],
            Duration::from_secs(5),
        )
    }

    fn chat_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(response: axum::response::Response) -> Value {
        let collected = response
            .into_body()
            .collect()
            .await
            .expect("body should read");
        serde_json::from_slice(&collected.to_bytes()).expect("body should be json")
    }

    #[tokio::test]
    async fn health_reports_ok_without_probing_downstreams() {
        let state = state_for(
            &[("psych", "http://127.0.0.1:1".to_string())],
            Duration::from_secs(1),
        );
        let app = app_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("handler should respond");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn relays_downstream_reply() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/psych/chat")
                    .json_body(json!({ "message": "Hello" }));
                then.status(200).json_body(json!({ "reply": "Hi" }));
            })
            .await;
        let app = app_router(state_with_psych(&server));

        let response = app
            .oneshot(chat_request(json!({ "message": "Hello", "domain": "psych" })))
            .await
            .expect("handler should respond");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await, json!({ "reply": "Hi" }));
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn accepts_legacy_text_field() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/legal/chat")
                    .json_body(json!({ "message": "Can I sue?" }));
                then.status(200).json_body(json!({ "reply": "It depends" }));
            })
            .await;
        let app = app_router(state_with_psych(&server));

        let response = app
            .oneshot(chat_request(json!({ "text": "Can I sue?", "domain": "legal" })))
            .await
            .expect("handler should respond");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await, json!({ "reply": "It depends" }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unknown_domain_is_rejected_without_forwarding() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.path_contains("/");
                then.status(200).json_body(json!({ "reply": "unused" }));
            })
            .await;
        let app = app_router(state_with_psych(&server));

        let response = app
            .oneshot(chat_request(json!({ "message": "Hello", "domain": "unknown" })))
            .await
            .expect("handler should respond");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            read_json(response).await,
            json!({ "error": "unsupported domain: unknown" })
        );
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn empty_message_is_rejected_without_forwarding() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.path_contains("/");
                then.status(200).json_body(json!({ "reply": "unused" }));
            })
            .await;
        let app = app_router(state_with_psych(&server));

        let response = app
            .oneshot(chat_request(json!({ "message": "", "domain": "psych" })))
            .await
            .expect("handler should respond");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert!(body["error"].is_string());
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn unparsable_body_yields_json_error() {
        let state = state_for(
            &[("psych", "http://127.0.0.1:1".to_string())],
            Duration::from_secs(1),
        );
        let app = app_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/chat")
                    .body(Body::from("message=Hello&domain=psych"))
                    .unwrap(),
            )
            .await
            .expect("handler should respond");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert!(body["error"]
            .as_str()
            .is_some_and(|error| error.starts_with("invalid request body")));
    }

    #[tokio::test]
    async fn oversized_body_yields_json_error() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.path_contains("/");
                then.status(200).json_body(json!({ "reply": "unused" }));
            })
            .await;
        let app = app_router(state_with_psych(&server));

        let message = "a".repeat(3 * 1024 * 1024);
        let response = app
            .oneshot(chat_request(json!({ "message": message, "domain": "psych" })))
            .await
            .expect("handler should respond");

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE),
            Some(&header::HeaderValue::from_static("application/json"))
        );
        assert!(read_json(response).await["error"].is_string());
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn downstream_timeout_maps_to_service_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/psych/chat");
                then.status(200)
                    .delay(Duration::from_secs(3))
                    .json_body(json!({ "reply": "too late" }));
            })
            .await;
        let app = app_router(state_for(
            &[("psych", server.url("/psych"))],
            Duration::from_millis(200),
        ));

        let started = std::time::Instant::now();
        let response = app
            .oneshot(chat_request(json!({ "message": "Hello", "domain": "psych" })))
            .await
            .expect("handler should respond");

        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(read_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn non_json_downstream_body_maps_to_bad_gateway() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/psych/chat");
                then.status(200).body("Internal garbage <pre>stack</pre>");
            })
            .await;
        let app = app_router(state_with_psych(&server));

        let response = app
            .oneshot(chat_request(json!({ "message": "Hello", "domain": "psych" })))
            .await
            .expect("handler should respond");

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = read_json(response).await;
        let error = body["error"].as_str().expect("error string");
        assert!(!error.contains("garbage"));
        assert!(!error.contains("stack"));
    }

    #[tokio::test]
    async fn downstream_rate_limit_is_relayed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/psych/chat");
                then.status(429).header("Retry-After", "5");
            })
            .await;
        let app = app_router(state_with_psych(&server));

        let response = app
            .oneshot(chat_request(json!({ "message": "Hello", "domain": "psych" })))
            .await
            .expect("handler should respond");

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok()),
            Some("5")
        );
        assert!(read_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn metrics_exports_dispatch_counters() {
        let server = MockServer::start_async().await;
        let state = state_with_psych(&server);

        app_router(state.clone())
            .oneshot(chat_request(json!({ "message": "Hello", "domain": "nowhere" })))
            .await
            .expect("handler should respond");
        app_router(state.clone())
            .oneshot(chat_request(json!({ "domain": "psych" })))
            .await
            .expect("handler should respond");

        let response = app_router(state)
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("handler should respond");

        assert_eq!(response.status(), StatusCode::OK);
        let collected = response
            .into_body()
            .collect()
            .await
            .expect("body should read");
        let body = String::from_utf8(collected.to_bytes().to_vec()).expect("utf-8");
        assert!(body.contains("dispatch_build_info"));
        assert!(body.contains("dispatch_uptime_seconds"));
        assert!(body.contains("dispatch_domains_registered 2\n"));
        assert!(body.contains("dispatch_requests_total"));
        assert!(body.contains(r#"domain="unregistered""#));
        assert!(body.contains(r#"domain="invalid""#));
    }
}
