use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::DispatchError;
use crate::forwarder::Forwarder;
use crate::registry::DomainRegistry;
use crate::types::{ChatReply, ChatRequest};

/// Routes chat prompts to the downstream service registered for their domain.
#[derive(Clone)]
pub struct Dispatcher {
    registry: DomainRegistry,
    forwarder: Arc<dyn Forwarder>,
}

impl Dispatcher {
    pub fn new(registry: DomainRegistry, forwarder: Arc<dyn Forwarder>) -> Self {
        Self {
            registry,
            forwarder,
        }
    }

    pub fn registry(&self) -> &DomainRegistry {
        &self.registry
    }

    /// Validates, resolves and forwards one request.
    ///
    /// At most one downstream call is made and failures are never retried.
    pub async fn handle_chat(&self, request: &ChatRequest) -> Result<ChatReply, DispatchError> {
        if request.message.trim().is_empty() {
            return Err(DispatchError::InvalidRequest(
                "message must not be empty".to_string(),
            ));
        }

        let endpoint = self
            .registry
            .resolve(&request.domain)
            .ok_or_else(|| DispatchError::DomainNotFound(request.domain.clone()))?;

        match self.forwarder.forward(endpoint, &request.message).await {
            Ok(reply) => {
                debug!(
                    stage = "dispatch",
                    domain = %request.domain,
                    reply_len = reply.len(),
                    "downstream replied"
                );
                Ok(ChatReply::reply(reply))
            }
            Err(err) => {
                warn!(
                    stage = "dispatch",
                    domain = %request.domain,
                    %endpoint,
                    error = %err,
                    "downstream call failed"
                );
                Err(err.into())
            }
        }
    }
}
