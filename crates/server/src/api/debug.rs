//! Debug endpoints for operators.
//!
//! These endpoints are only accessible from allowed networks (localhost/internal).
//! Failures are reported inside a `200` JSON body, never through the status code.

use crate::{AppResources, client_addr::ClientAddr, entity::open_event::NewOpenEvent};
use axum::{
    Extension, Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use time::OffsetDateTime;
use utoipa_axum::{router::OpenApiRouter, routes};

pub const DEBUG_TAG: &str = "Debug";

const SETUP_SUGGESTION: &str =
    "Run the migration CLI (crates/migration) against the store to create the schema manually";

/// Creates the debug router.
pub fn router() -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(store_probe))
        .routes(routes!(setup_store))
}

/// Check if the client IP is allowed to access debug endpoints.
fn is_allowed(resources: &AppResources, client: &ClientAddr) -> bool {
    let Some(ip) = client.ip() else {
        return false;
    };
    resources
        .config
        .debug_allowed_nets
        .iter()
        .any(|net| net.contains(&ip))
}

fn denied() -> Response {
    (StatusCode::FORBIDDEN, "Access denied").into_response()
}

/// Probe the store with a cheap read.
#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/store",
    tag = DEBUG_TAG,
    operation_id = "Probe Store",
    summary = "Check store connectivity",
    description = "Runs a lightweight read against the event store and reports the outcome.\n\n\
                   The status code is 200 whether or not the store answered; inspect `status` in the body.\n\n\
                   **Access control:** Only accessible from allowed networks. \
                   Configure allowed networks via `debug_allowed_nets` in the server configuration.",
    responses(
        (status = 200, description = "Probe result", content_type = "application/json",
         example = json!({"status": "success", "message": "Store connection working", "data": {"event_count": 12}})),
        (status = 403, description = "Access denied - client IP not in allowed networks"),
    )
)]
pub async fn store_probe(
    Extension(resources): Extension<AppResources>,
    client: ClientAddr,
) -> Response {
    if !is_allowed(&resources, &client) {
        return denied();
    }

    match resources.store.probe().await {
        Ok(event_count) => Json(json!({
            "status": "success",
            "message": "Store connection working",
            "data": { "event_count": event_count },
        }))
        .into_response(),
        Err(e) => {
            tracing::warn!(error = ?e, "Store probe failed");
            let kind = if e.is_connection_error() {
                "unreachable"
            } else {
                "operation"
            };
            Json(json!({
                "status": "error",
                "message": e.to_string(),
                "details": {
                    "kind": kind,
                    "debug": format!("{e:?}"),
                },
            }))
            .into_response()
        }
    }
}

/// Create the schema if needed and prove that events can be written and removed.
#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/setup-store",
    tag = DEBUG_TAG,
    operation_id = "Setup Store",
    summary = "Idempotent schema setup",
    description = "Creates the event table and indexes if they are missing, then inserts and deletes a \
                   throwaway event to confirm write access. Safe to call repeatedly.\n\n\
                   If schema creation fails the write test still runs; a failed write test returns a \
                   suggestion to run the migration CLI.\n\n\
                   **Access control:** Only accessible from allowed networks, and only when \
                   `debug.setup_enabled` is true.",
    responses(
        (status = 200, description = "Setup result", content_type = "application/json",
         example = json!({"status": "success", "message": "Store setup successful", "table_created": true, "test_insert": "passed", "cleanup": "passed"})),
        (status = 403, description = "Access denied - client IP not in allowed networks"),
        (status = 404, description = "Setup endpoint disabled via configuration"),
    )
)]
pub async fn setup_store(
    Extension(resources): Extension<AppResources>,
    client: ClientAddr,
) -> Response {
    if !resources.config.debug.setup_enabled {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }
    if !is_allowed(&resources, &client) {
        return denied();
    }

    tracing::info!("Setting up store schema");
    let schema_error = match resources.store.ensure_schema().await {
        Ok(()) => None,
        Err(e) => {
            tracing::warn!(error = ?e, "Could not create schema, testing insert anyway");
            Some(e.to_string())
        }
    };

    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let probe = NewOpenEvent {
        user_agent: Some("Setup Test".to_string()),
        ip_address: Some("127.0.0.1".to_string()),
        ..NewOpenEvent::now(format!("test-setup-{millis}"))
    };

    let row = match resources.store.append(probe).await {
        Ok(row) => row,
        Err(e) => {
            tracing::error!(
                name = "api.debug.setup_insert_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = ?e,
                message = "Store setup test insert failed"
            );
            return Json(json!({
                "status": "error",
                "message": "Store setup failed",
                "details": e.to_string(),
                "schema_error": schema_error,
                "suggestion": SETUP_SUGGESTION,
            }))
            .into_response();
        }
    };

    let cleanup = match resources.store.delete_by_email_id(&row.email_id).await {
        Ok(_) => "passed",
        Err(e) => {
            tracing::warn!(error = ?e, email_id = %row.email_id, "Failed to remove setup test row");
            "failed"
        }
    };

    Json(json!({
        "status": "success",
        "message": "Store setup successful",
        "table_created": schema_error.is_none(),
        "schema_error": schema_error,
        "test_insert": "passed",
        "cleanup": cleanup,
    }))
    .into_response()
}
