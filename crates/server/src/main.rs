use color_eyre::eyre::{WrapErr, eyre};
use email_open_tracker::AppResources;
use email_open_tracker::api::start_webserver;
use email_open_tracker::config::load_config;
use email_open_tracker::store::{DatabaseStore, EventStore};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_tracing() {
    let default_directives = "email_open_tracker=info,tower_http=info,sea_orm=warn";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

/// Fails when the store cannot answer a simple read.
async fn verify_store(store: &dyn EventStore) -> color_eyre::Result<()> {
    tracing::info!("Testing store connection");
    let count = store
        .probe()
        .await
        .wrap_err("Store connection failed, check store.url and store.password")?;
    tracing::info!(event_count = count, "Store connection successful");
    Ok(())
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;

    // A missing .env is fine; config may come from config.yaml or the real environment
    dotenvy::dotenv().ok();
    initialize_tracing();

    let config = load_config().wrap_err("Missing or invalid configuration")?;

    let store = Arc::new(
        DatabaseStore::connect(&config.store)
            .await
            .wrap_err("Failed to connect to store")?,
    );
    if config.store.auto_migrate {
        store.ensure_schema().await?;
        tracing::info!("Store schema is up to date");
    }

    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    tracing::info!(addr = %config.listen_addr(), "Email tracking server running");
    tracing::info!(
        pixel = %format!("http://{}/track/{{message_id}}", config.listen_addr()),
        policy = ?config.tracking.on_store_failure,
        "Tracking pixel endpoint"
    );

    let resources = AppResources::new(store.clone(), config);
    let server = tokio::spawn(start_webserver(listener, resources));

    // Routes are already live; an unreachable store still stops the process
    if let Err(e) = verify_store(store.as_ref()).await {
        server.abort();
        store.close().await.ok();
        return Err(e);
    }

    let served = server
        .await
        .map_err(|e| eyre!("Server task failed: {e}"))?;
    store.close().await?;
    served
}
