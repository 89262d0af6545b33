pub mod config;

use std::{env, net::SocketAddr};

pub use config::{AppConfig, ConfigError, DomainRoute, Environment};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Domain table used when `DISPATCH_DOMAINS` is not set.
pub const DEFAULT_DOMAINS: &str =
    "psych=http://psych-lora:8000,legal=http://legal-lora:8000,social=http://social-lora:8000";

/// Outbound timeout used when `DISPATCH_TIMEOUT_SECS` is not set.
pub const DEFAULT_FORWARD_TIMEOUT_SECS: u64 = 30;

/// Loads environment variables from `.env` when available.
///
/// Missing files are ignored so container deployments that inject the
/// variables directly keep working.
pub fn load_env_file() {
    let _ = dotenvy::dotenv();
}

/// Returns the address the dispatcher should listen on.
///
/// Read from `APP_BIND_ADDR`, falling back to [`DEFAULT_BIND_ADDR`].
pub fn server_bind_address() -> Result<SocketAddr, std::net::AddrParseError> {
    env::var("APP_BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse()
}
