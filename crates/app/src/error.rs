use axum::{
    extract::rejection::BytesRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chat_dispatch_core::{ChatReply, DispatchError};

/// Request failure rendered as a JSON `{ "error": ... }` body.
#[derive(Debug)]
pub enum ApiError {
    Dispatch(DispatchError),
    /// The request body could not be read (too large, aborted stream).
    Body { status: StatusCode, message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Dispatch(err) => match err {
                DispatchError::InvalidRequest(_) | DispatchError::DomainNotFound(_) => {
                    StatusCode::BAD_REQUEST
                }
                DispatchError::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                DispatchError::UpstreamError => StatusCode::BAD_GATEWAY,
                DispatchError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            },
            Self::Body { status, .. } => *status,
        }
    }

    fn to_reply(&self) -> ChatReply {
        match self {
            Self::Dispatch(err) => err.to_reply(),
            Self::Body { message, .. } => ChatReply::error(message.clone()),
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(value: DispatchError) -> Self {
        Self::Dispatch(value)
    }
}

impl From<BytesRejection> for ApiError {
    fn from(value: BytesRejection) -> Self {
        Self::Body {
            status: value.status(),
            message: value.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(self.to_reply())).into_response();
        if let Self::Dispatch(DispatchError::RateLimited {
            retry_after: Some(value),
        }) = &self
        {
            if let Ok(value) = HeaderValue::from_str(value) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
