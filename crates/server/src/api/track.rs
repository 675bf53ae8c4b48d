//! The tracking pixel.

use crate::{
    AppResources, client_addr::ClientAddr, config::StoreFailurePolicy,
    entity::open_event::NewOpenEvent, pixel::PixelResponse,
};
use axum::{
    Extension,
    extract::Path,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};

/// Tag for OpenAPI documentation.
pub const TRACKING_TAG: &str = "Tracking";

/// Record an open of `message_id` and serve the pixel.
#[tracing::instrument(skip(resources, client, headers), fields(email_id = %message_id))]
#[utoipa::path(
    get,
    path = "/track/{message_id}",
    tag = TRACKING_TAG,
    operation_id = "Track Open",
    summary = "Tracking pixel",
    description = "Records one open event for the message and returns a 1x1 transparent GIF.\n\n\
                   Every request is recorded; repeated opens are not deduplicated. If the event cannot \
                   be stored the response depends on `tracking.on_store_failure`: `fail` answers 500, \
                   `serve_pixel` returns the image anyway.",
    params(
        ("message_id" = String, Path, description = "Opaque identifier of the sent message")
    ),
    responses(
        (status = 200, description = "Open recorded", content_type = "image/gif"),
        (status = 500, description = "The open could not be recorded", body = str, content_type = "text/plain", example = "Tracking failed")
    )
)]
pub async fn track_open(
    Extension(resources): Extension<AppResources>,
    Path(message_id): Path<String>,
    client: ClientAddr,
    headers: HeaderMap,
) -> Response {
    // Stored as received; non-UTF-8 bytes become U+FFFD
    let event = NewOpenEvent {
        user_agent: headers
            .get(header::USER_AGENT)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned()),
        ip_address: client.ip().map(|ip| ip.to_string()),
        ..NewOpenEvent::now(message_id)
    };

    match resources.store.append(event).await {
        Ok(row) => {
            tracing::info!(id = row.id, opened_at = %row.opened_at, "Email open tracked");
            PixelResponse.into_response()
        }
        Err(e) => {
            tracing::error!(
                name = "api.track.store_append_failed",
                target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                error = ?e,
                message = "Failed to record email open"
            );
            match resources.config.tracking.on_store_failure {
                StoreFailurePolicy::Fail => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "Tracking failed").into_response()
                }
                StoreFailurePolicy::ServePixel => PixelResponse.into_response(),
            }
        }
    }
}
