use serde::Serialize;

/// Liveness payload. Downstream services are not probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

/// Reports that the process is alive.
pub fn report() -> HealthStatus {
    HealthStatus { status: "ok" }
}
