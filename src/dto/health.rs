use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall status ("ok" or "degraded").
    pub status: &'static str,
    /// Whether the service is currently running without storage.
    pub degraded: bool,
}

impl HealthResponse {
    /// The system is operational.
    pub fn ok() -> Self {
        Self {
            status: "ok",
            degraded: false,
        }
    }

    /// The system is serving without a storage backend.
    pub fn degraded() -> Self {
        Self {
            status: "degraded",
            degraded: true,
        }
    }
}
