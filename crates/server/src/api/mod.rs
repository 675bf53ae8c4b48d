//! API module providing HTTP endpoints for the tracker.
//!
//! This module is organized into submodules:
//! - `track` - Tracking pixel (/track/{message_id})
//! - `tracking` - Recorded opens (/api/tracking)
//! - `health` - Health check endpoint (/health)
//! - `debug` - Store diagnostics (/debug/*)
//! - `openapi` - OpenAPI/Utoipa configuration
//!
//! Anything else is served from the static dashboard directory.

pub mod debug;
pub mod health;
pub mod openapi;
pub mod track;
pub mod tracking;

use crate::AppResources;
use axum::{Extension, Router};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_axum::{router::OpenApiRouter, routes};
use utoipa_redoc::{Redoc, Servable};

/// Builds the application router with all routes and layers attached.
pub fn router(app_resources: AppResources) -> Router {
    let static_dir = app_resources.config.static_dir.clone();

    let (router, api) = OpenApiRouter::with_openapi(openapi::ApiDoc::openapi())
        .routes(routes!(track::track_open))
        .routes(routes!(tracking::list_events))
        .routes(routes!(health::health))
        .nest("/debug", debug::router())
        .layer(Extension(app_resources))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .split_for_parts();

    router
        .merge(Redoc::with_url("/api-docs", api))
        .fallback_service(ServeDir::new(static_dir))
}

/// Serves the application on `listener` until a shutdown signal arrives.
#[tracing::instrument(skip_all)]
pub async fn start_webserver(
    listener: TcpListener,
    app_resources: AppResources,
) -> color_eyre::Result<()> {
    let router = router(app_resources);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| color_eyre::Report::msg(format!("Failed to start server: {e}")))?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = ?e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = ?e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
