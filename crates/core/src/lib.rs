//! Domain routing for chat prompts.
//!
//! A [`Dispatcher`] owns an immutable [`DomainRegistry`] and a [`Forwarder`]
//! capability. HTTP concerns live in the app and downstream crates.

pub mod dispatcher;
pub mod error;
pub mod forwarder;
pub mod health;
pub mod registry;
pub mod types;

pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use forwarder::{ForwardError, Forwarder};
pub use health::HealthStatus;
pub use registry::{DomainRegistry, RegistryError};
pub use types::{ChatReply, ChatRequest, InboundChat};
