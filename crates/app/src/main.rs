mod chat;
mod error;
mod router;
mod telemetry;

use std::{net::SocketAddr, sync::Arc};

use chat_dispatch_core::{Dispatcher, DomainRegistry};
use chat_dispatch_downstream::DownstreamClient;
use chat_dispatch_util::{load_env_file, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    let metrics = telemetry::init_metrics()?;

    let registry = DomainRegistry::from_routes(
        config
            .domains
            .iter()
            .map(|route| (route.domain.clone(), route.endpoint.as_str())),
    )?;
    for domain in registry.domains() {
        if let Some(endpoint) = registry.resolve(domain) {
            info!(stage = "app", domain, %endpoint, "domain registered");
        }
    }

    let forwarder = DownstreamClient::new(config.forward_timeout)?;
    let dispatcher = Dispatcher::new(registry, Arc::new(forwarder));
    let state = router::AppState::new(metrics, dispatcher);

    let addr: SocketAddr = config.bind_addr;
    info!(
        stage = "app",
        %addr,
        env = %config.environment.as_str(),
        timeout_secs = config.forward_timeout.as_secs(),
        "starting HTTP server"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router::app_router(state))
        .await
        .map_err(|err| err.into())
}
