use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tracing::info;

use textportal_core::{AppConfig, HttpServer, Regenerator, SchedulerService, ServingDispatcher};

use super::Portal;

pub async fn run(config: Arc<AppConfig>) -> Result<()> {
    let portal = Portal::assemble(&config).await?;
    let regenerator: Arc<dyn Regenerator> = portal.job;

    let dispatcher = Arc::new(ServingDispatcher::new(
        portal.cache,
        Arc::clone(&regenerator),
        config.cache.front_page_key.clone(),
        config.cache.archive_key.clone(),
        config.route_prefix(),
    ));

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Setup signal handlers for graceful shutdown
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        let _ = shutdown_tx_clone.send(true);
    });

    let scheduler = SchedulerService::new(
        regenerator,
        Duration::from_secs(config.server.refresh_interval_secs),
    );
    let scheduler_handle = tokio::spawn(scheduler.run(shutdown_rx.clone()));

    println!("Serving on {}. Press Ctrl+C to stop.", config.server.bind);
    if config.server.refresh_interval_secs > 0 {
        println!("  Refresh interval: {} seconds", config.server.refresh_interval_secs);
    }

    let result = HttpServer::new(dispatcher, config.server.bind.clone())
        .run(shutdown_rx)
        .await;

    // Stop the scheduler even if the server failed on its own
    let _ = shutdown_tx.send(true);
    scheduler_handle.await?;

    result?;
    println!("Server stopped.");
    Ok(())
}
