use std::{
    collections::{btree_map::Entry, BTreeMap},
    sync::Arc,
};

use thiserror::Error;
use url::Url;

/// Immutable mapping from domain identifier to downstream base URL.
///
/// Built once at start-up; clones share the same table.
#[derive(Debug, Clone)]
pub struct DomainRegistry {
    routes: Arc<BTreeMap<String, Url>>,
}

impl DomainRegistry {
    /// Builds the registry from `(domain, endpoint)` pairs.
    ///
    /// Endpoints are stored with a trailing `/` so joining `chat` keeps any
    /// path prefix of the base URL.
    pub fn from_routes<I, D, E>(routes: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (D, E)>,
        D: Into<String>,
        E: AsRef<str>,
    {
        let mut table = BTreeMap::new();
        for (domain, endpoint) in routes {
            let domain = domain.into();
            validate_domain(&domain)?;
            let url = parse_endpoint(&domain, endpoint.as_ref())?;
            match table.entry(domain) {
                Entry::Occupied(entry) => return Err(RegistryError::Duplicate(entry.key().clone())),
                Entry::Vacant(entry) => {
                    entry.insert(url);
                }
            }
        }

        if table.is_empty() {
            return Err(RegistryError::Empty);
        }

        Ok(Self {
            routes: Arc::new(table),
        })
    }

    /// Case-sensitive lookup; there is no default domain.
    pub fn resolve(&self, domain: &str) -> Option<&Url> {
        self.routes.get(domain)
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.routes.contains_key(domain)
    }

    /// Registered domains in lexical order.
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Errors raised while building a [`DomainRegistry`].
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("at least one domain must be configured")]
    Empty,
    #[error("domain identifiers must be non-empty and contain no whitespace (got '{0}')")]
    InvalidDomain(String),
    #[error("domain '{0}' is configured more than once")]
    Duplicate(String),
    #[error("endpoint for domain '{domain}' is not a valid url: {source}")]
    InvalidEndpoint {
        domain: String,
        source: url::ParseError,
    },
    #[error("endpoint for domain '{domain}' must use http or https (got '{scheme}')")]
    UnsupportedScheme { domain: String, scheme: String },
}

fn validate_domain(domain: &str) -> Result<(), RegistryError> {
    if domain.is_empty() || domain.chars().any(char::is_whitespace) {
        return Err(RegistryError::InvalidDomain(domain.to_string()));
    }
    Ok(())
}

fn parse_endpoint(domain: &str, raw: &str) -> Result<Url, RegistryError> {
    let mut url = Url::parse(raw.trim()).map_err(|source| RegistryError::InvalidEndpoint {
        domain: domain.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(RegistryError::UnsupportedScheme {
                domain: domain.to_string(),
                scheme: other.to_string(),
            })
        }
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}
