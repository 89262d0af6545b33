use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

/// Raw `POST /chat` body as sent by callers.
///
/// `message` is the canonical field. `text` is still accepted from older
/// front ends and is only consulted when `message` is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InboundChat {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

impl InboundChat {
    /// Returns `true` when the prompt will be taken from the deprecated `text` field.
    pub fn uses_legacy_text(&self) -> bool {
        self.message.is_none() && self.text.is_some()
    }

    /// Converts the raw body into a [`ChatRequest`].
    ///
    /// Only presence is checked here; content validation belongs to the dispatcher.
    pub fn into_request(self) -> Result<ChatRequest, DispatchError> {
        let message = self
            .message
            .or(self.text)
            .ok_or_else(|| DispatchError::InvalidRequest("message is required".to_string()))?;
        let domain = self
            .domain
            .ok_or_else(|| DispatchError::InvalidRequest("domain is required".to_string()))?;
        Ok(ChatRequest { message, domain })
    }
}

/// A prompt addressed to one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub domain: String,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            domain: domain.into(),
        }
    }
}

/// Body returned to callers of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatReply {
    Reply { reply: String },
    Error { error: String },
}

impl ChatReply {
    pub fn reply(text: impl Into<String>) -> Self {
        Self::Reply { reply: text.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }
}
