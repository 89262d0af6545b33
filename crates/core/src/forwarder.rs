use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Capability that delivers one prompt to a downstream chat service.
///
/// Implementations make exactly one attempt per call.
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Sends `message` to the `/chat` path under `endpoint` and returns the reply text.
    async fn forward(&self, endpoint: &Url, message: &str) -> Result<String, ForwardError>;
}

/// Errors produced while forwarding to a downstream service.
///
/// These carry internal detail for logging and are never shown to callers.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to build url: {0}")]
    Url(#[from] url::ParseError),
    #[error("downstream timed out")]
    Timeout,
    #[error("downstream unreachable: {0}")]
    Unreachable(String),
    #[error("downstream rate limited")]
    RateLimited { retry_after: Option<String> },
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed downstream reply: {0}")]
    Malformed(String),
}
