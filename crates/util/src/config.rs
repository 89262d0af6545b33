use std::{env, fmt, net::SocketAddr, time::Duration};

use super::{server_bind_address, DEFAULT_DOMAINS, DEFAULT_FORWARD_TIMEOUT_SECS};

/// Application runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }

    /// Returns `true` when logs should be human readable rather than JSON.
    pub fn is_development(self) -> bool {
        matches!(self, Self::Development | Self::Test)
    }

    /// Returns the canonical name used for logging/metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// One `domain=url` entry of the routing table, not yet validated as a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainRoute {
    pub domain: String,
    pub endpoint: String,
}

/// Runtime configuration resolved from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    pub domains: Vec<DomainRoute>,
    pub forward_timeout: Duration,
}

impl AppConfig {
    /// Constructs the configuration by reading and validating environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_value = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let environment = Environment::from_str(&env_value)?;
        let bind_addr = server_bind_address().map_err(ConfigError::BindAddress)?;

        let table = env::var("DISPATCH_DOMAINS").unwrap_or_else(|_| DEFAULT_DOMAINS.to_string());
        let domains = parse_domain_table(&table)?;

        let forward_timeout = match env::var("DISPATCH_TIMEOUT_SECS") {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => Duration::from_secs(DEFAULT_FORWARD_TIMEOUT_SECS),
        };

        Ok(Self {
            bind_addr,
            environment,
            domains,
            forward_timeout,
        })
    }
}

/// Parses a comma separated `domain=url` list.
///
/// Blank items are skipped so trailing commas are tolerated.
pub fn parse_domain_table(raw: &str) -> Result<Vec<DomainRoute>, ConfigError> {
    let mut routes = Vec::new();
    for item in raw.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let Some((domain, endpoint)) = item.split_once('=') else {
            return Err(ConfigError::MalformedDomainEntry(item.to_string()));
        };
        let (domain, endpoint) = (domain.trim(), endpoint.trim());
        if domain.is_empty() || endpoint.is_empty() {
            return Err(ConfigError::MalformedDomainEntry(item.to_string()));
        }
        routes.push(DomainRoute {
            domain: domain.to_string(),
            endpoint: endpoint.to_string(),
        });
    }
    Ok(routes)
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    InvalidEnvironment(String),
    BindAddress(std::net::AddrParseError),
    MalformedDomainEntry(String),
    InvalidTimeout(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnvironment(value) => write!(
                f,
                "APP_ENV must be one of 'development', 'production', or 'test' (got {value})"
            ),
            Self::BindAddress(err) => write!(f, "invalid APP_BIND_ADDR value: {err}"),
            Self::MalformedDomainEntry(entry) => write!(
                f,
                "DISPATCH_DOMAINS entries must look like 'domain=url' (got '{entry}')"
            ),
            Self::InvalidTimeout(value) => write!(
                f,
                "DISPATCH_TIMEOUT_SECS must be a positive number of seconds (got '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
