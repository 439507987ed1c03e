use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use sg_api::{app, shutdown, AppState};
use sg_catalog::{ChangeHub, PriceWatcher, VisibilitySignal, PRODUCTS_TABLE};
use sg_store::{app_config::Config, ChangeListener, ServiceClient, StoreOrderRepository, StorePriceRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sg_api=debug,sg_store=info,sg_catalog=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Seven Green API on port {}", config.server.port);

    // Service-role pool shared by every privileged read
    let client = ServiceClient::connect(&config.store)
        .await
        .context("Failed to connect to store")?;

    if config.store.run_migrations {
        client.migrate().await.context("Failed to run migrations")?;
    }

    // Realtime changes
    let hub = ChangeHub::new(config.realtime.capacity);
    let listener_task = ChangeListener::start(&client, &config.realtime.channel, hub.clone())
        .await
        .context("Failed to start change listener")?;

    let visibility = VisibilitySignal::new();
    let watcher = PriceWatcher::spawn(
        Arc::new(StorePriceRepository::new(client.pool.clone())),
        hub.subscribe(PRODUCTS_TABLE),
        visibility.listen(),
        config.pricing.fallback_price,
    );

    let app_state = AppState {
        orders: Arc::new(StoreOrderRepository::new(client.pool.clone())),
        prices: watcher.state(),
        visibility,
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    // Stopping the watcher ends open price streams so the server can drain.
    axum::serve(listener, app(app_state))
        .with_graceful_shutdown(async move {
            shutdown::signal().await;
            watcher.shutdown().await;
        })
        .await
        .context("Server error")?;

    listener_task.abort();
    tracing::info!("Shut down cleanly");
    Ok(())
}
