//! Read access to recorded opens.

use crate::{AppResources, api::track::TRACKING_TAG, entity::open_event::OpenEvent};
use axum::{
    Extension, Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// List every recorded open, newest first.
#[tracing::instrument(skip(resources))]
#[utoipa::path(
    get,
    path = "/api/tracking",
    tag = TRACKING_TAG,
    operation_id = "List Opens",
    summary = "List recorded email opens",
    description = "Returns all open events ordered by `opened_at`, most recent first. \
                   An empty store yields an empty array.",
    responses(
        (status = 200, description = "All recorded opens", body = Vec<OpenEvent>),
        (status = 500, description = "The store could not be read", content_type = "application/json",
         example = json!({"error": "Failed to fetch tracking data", "details": "connection refused"}))
    )
)]
pub async fn list_events(Extension(resources): Extension<AppResources>) -> Response {
    match resources.store.list_recent().await {
        Ok(events) => {
            tracing::debug!(count = events.len(), "Retrieved tracking records");
            Json(events).into_response()
        }
        Err(e) => {
            tracing::error!(
                name = "api.tracking.store_list_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = ?e,
                message = "Failed to fetch tracking data"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to fetch tracking data",
                    "details": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}
