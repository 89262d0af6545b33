use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{
    BuildError as PrometheusBuildError, PrometheusBuilder, PrometheusHandle,
};
use std::{
    fmt::Write as _,
    sync::{Mutex, OnceLock},
    time::Instant,
};
use thiserror::Error;
use tracing_subscriber::{
    fmt::{self as tracing_fmt, time::UtcTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use chat_dispatch_core::DomainRegistry;
use chat_dispatch_util::AppConfig;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to initialize tracing: {0}")]
    Tracing(#[from] tracing_subscriber::util::TryInitError),
    #[error("failed to initialize prometheus recorder: {0}")]
    Metrics(#[from] PrometheusBuildError),
}

static TRACING_INIT: OnceLock<()> = OnceLock::new();
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static METRICS_INSTALL_GUARD: Mutex<()> = Mutex::new(());
static START_TIME: OnceLock<Instant> = OnceLock::new();

const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Installs the global subscriber: pretty output for local runs, JSON in production.
pub fn init_tracing(config: &AppConfig) -> Result<(), TelemetryError> {
    if TRACING_INIT.get().is_some() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    if config.environment.is_development() {
        let fmt_layer = tracing_fmt::layer().event_format(
            tracing_fmt::format()
                .pretty()
                .with_target(false)
                .with_timer(UtcTime::rfc_3339()),
        );
        registry.with(fmt_layer).try_init()?;
    } else {
        let fmt_layer = tracing_fmt::layer()
            .with_target(false)
            .with_timer(UtcTime::rfc_3339())
            .json();
        registry.with(fmt_layer).try_init()?;
    }

    TRACING_INIT.set(()).ok();
    tracing::info!(
        stage = "telemetry",
        env = %config.environment.as_str(),
        version = BUILD_VERSION,
        "tracing initialized"
    );
    Ok(())
}

/// Installs the Prometheus recorder once per process and returns its handle.
pub fn init_metrics() -> Result<PrometheusHandle, TelemetryError> {
    if let Some(handle) = METRICS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let _guard = METRICS_INSTALL_GUARD
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(handle) = METRICS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    METRICS_HANDLE.set(handle.clone()).ok();

    describe_counter!(
        "dispatch_requests_total",
        "Count of chat requests handled, labelled by domain and result"
    );
    describe_histogram!(
        "dispatch_forward_latency_seconds",
        "Latency in seconds of forwarded chat requests, labelled by domain"
    );
    START_TIME.get_or_init(Instant::now);

    Ok(handle)
}

/// Renders recorder output followed by process gauges computed at scrape time.
pub fn render_metrics(handle: &PrometheusHandle, registry: &DomainRegistry) -> String {
    let mut body = handle.render();
    if !body.is_empty() && !body.ends_with('\n') {
        body.push('\n');
    }

    let uptime = START_TIME
        .get()
        .map(|start| start.elapsed().as_secs_f64())
        .unwrap_or_default();

    // Writing to a String cannot fail.
    let _ = write!(
        body,
        "# HELP dispatch_build_info Build version of the running dispatcher\n\
         # TYPE dispatch_build_info gauge\n\
         dispatch_build_info{{version=\"{BUILD_VERSION}\"}} 1\n\
         # HELP dispatch_domains_registered Number of domains in the routing table\n\
         # TYPE dispatch_domains_registered gauge\n\
         dispatch_domains_registered {}\n\
         # HELP dispatch_uptime_seconds Seconds since the process started\n\
         # TYPE dispatch_uptime_seconds gauge\n\
         dispatch_uptime_seconds {uptime}\n",
        registry.len(),
    );

    body
}
