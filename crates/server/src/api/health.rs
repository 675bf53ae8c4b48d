//! Health check endpoint.

use crate::AppResources;
use axum::{Extension, Json};
use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use utoipa::ToSchema;

/// Tag for OpenAPI documentation.
pub const MISC_TAG: &str = "Miscellaneous";

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: String,
    /// `Configured` or `Missing`.
    pub store_url: &'static str,
    /// `Configured` or `Missing`.
    pub store_credential: &'static str,
}

fn presence(configured: bool) -> &'static str {
    if configured { "Configured" } else { "Missing" }
}

/// Health check endpoint.
#[tracing::instrument(skip(resources))]
#[utoipa::path(
    method(get, head),
    path = "/health",
    tag = MISC_TAG,
    operation_id = "Health Check",
    summary = "Service health check",
    description = "Reports that the process is up and whether store connection settings are present.\n\n\
                   This is a liveness check only: it never contacts the store. Use `/debug/store` \
                   to probe reachability.",
    responses(
        (status = 200, description = "Service is running", body = HealthReport)
    )
)]
pub async fn health(Extension(resources): Extension<AppResources>) -> Json<HealthReport> {
    let store = &resources.config.store;
    Json(HealthReport {
        status: "OK",
        timestamp: OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default(),
        store_url: presence(!store.url.trim().is_empty()),
        store_credential: presence(store.password.as_deref().is_some_and(|p| !p.is_empty())),
    })
}
