//! OpenAPI/Utoipa configuration.

use crate::api::{debug::DEBUG_TAG, health::MISC_TAG, track::TRACKING_TAG};
use utoipa::OpenApi;

/// OpenAPI documentation configuration.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Email Open Tracker API",
        version = "1.0.0",
        description = "Tracking pixel and read API for email open events."
    ),
    tags(
        (name = TRACKING_TAG, description = "Tracking pixel and recorded opens"),
        (name = MISC_TAG, description = "Miscellaneous endpoints"),
        (name = DEBUG_TAG, description = "Operator diagnostics, restricted to allowed networks")
    )
)]
pub struct ApiDoc;
