use thiserror::Error;

use crate::forwarder::ForwardError;
use crate::types::ChatReply;

/// Failures surfaced to callers of the dispatcher.
///
/// `Display` output is what callers see, so upstream variants stay generic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("unsupported domain: {0}")]
    DomainNotFound(String),
    #[error("domain service is unavailable, try again later")]
    UpstreamUnavailable,
    #[error("domain service returned an invalid response")]
    UpstreamError,
    #[error("domain service is busy, try again later")]
    RateLimited { retry_after: Option<String> },
}

impl DispatchError {
    /// Stable label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::DomainNotFound(_) => "domain_not_found",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::UpstreamError => "upstream_error",
            Self::RateLimited { .. } => "rate_limited",
        }
    }

    /// Returns the `{ "error": ... }` body for this failure.
    pub fn to_reply(&self) -> ChatReply {
        ChatReply::error(self.to_string())
    }
}

impl From<ForwardError> for DispatchError {
    fn from(err: ForwardError) -> Self {
        match err {
            ForwardError::Timeout | ForwardError::Unreachable(_) => Self::UpstreamUnavailable,
            ForwardError::RateLimited { retry_after } => Self::RateLimited { retry_after },
            ForwardError::Url(_) | ForwardError::Status { .. } | ForwardError::Malformed(_) => {
                Self::UpstreamError
            }
        }
    }
}
