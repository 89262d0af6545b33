use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    Json,
};
use chat_dispatch_core::{ChatReply, ChatRequest, DispatchError, DomainRegistry, InboundChat};
use metrics::{counter, histogram};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::router::AppState;

const UNREGISTERED_DOMAIN: &str = "unregistered";
/// Label for requests rejected before a domain could be read from the body.
const INVALID_DOMAIN: &str = "invalid";

/// `POST /chat`: forwards the prompt to the service registered for its domain.
///
/// The body is read raw so that unreadable or unparsable bodies still yield a
/// JSON error.
pub async fn handle(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(
                stage = "dispatch",
                status = rejection.status().as_u16(),
                error = %rejection.body_text(),
                "request body rejected"
            );
            record_outcome(INVALID_DOMAIN.to_string(), "body_rejected");
            return Err(rejection.into());
        }
    };

    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(err) => {
            record_outcome(INVALID_DOMAIN.to_string(), err.kind());
            return Err(err.into());
        }
    };

    let dispatcher = state.dispatcher();
    let domain_label = metric_domain(dispatcher.registry(), &request.domain);
    let started = Instant::now();
    let result = dispatcher.handle_chat(&request).await;

    if was_forwarded(&result) {
        histogram!("dispatch_forward_latency_seconds", "domain" => domain_label.clone())
            .record(started.elapsed().as_secs_f64());
    }

    match result {
        Ok(reply) => {
            record_outcome(domain_label, "ok");
            info!(
                stage = "dispatch",
                domain = %request.domain,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "chat request completed"
            );
            Ok(Json(reply))
        }
        Err(err) => {
            record_outcome(domain_label, err.kind());
            info!(
                stage = "dispatch",
                domain = %request.domain,
                result = err.kind(),
                "chat request failed"
            );
            Err(err.into())
        }
    }
}

fn parse_request(body: &[u8]) -> Result<ChatRequest, DispatchError> {
    let inbound: InboundChat = serde_json::from_slice(body)
        .map_err(|err| DispatchError::InvalidRequest(format!("invalid request body: {err}")))?;

    if inbound.uses_legacy_text() {
        warn!(
            stage = "dispatch",
            "request used deprecated 'text' field; send 'message' instead"
        );
    }

    inbound.into_request()
}

/// Unknown domains collapse into one label to keep metric cardinality bounded.
fn metric_domain(registry: &DomainRegistry, domain: &str) -> String {
    if registry.contains(domain) {
        domain.to_string()
    } else {
        UNREGISTERED_DOMAIN.to_string()
    }
}

fn was_forwarded(result: &Result<ChatReply, DispatchError>) -> bool {
    !matches!(
        result,
        Err(DispatchError::InvalidRequest(_) | DispatchError::DomainNotFound(_))
    )
}

fn record_outcome(domain: String, result: &'static str) {
    counter!("dispatch_requests_total", "domain" => domain, "result" => result).increment(1);
}
