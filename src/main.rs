use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use cryptosynth::config::Config;
use cryptosynth::dashboard::{server, DashboardState};
use cryptosynth::feeds::opportunities::OpportunityFeed;
use cryptosynth::telemetry::poll_health::PollHealth;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("================================================");
    info!("  CRYPTOSYNTH — Trading Bot Dashboard v0.1.0");
    info!("  Similarity + arbitrage opportunity monitor");
    info!("================================================");

    let config = Config::load_or_default();
    config.validate()?;
    let bind_addr: SocketAddr = config.server.bind_addr.parse()?;

    info!("--- Poller configuration ---");
    info!("  Bot API:         {}", config.api.base_url);
    info!("  Poll interval:   {}ms", config.api.poll_interval_ms);
    info!("  Request timeout: {}s", config.api.request_timeout_secs);

    // Shutdown signal
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Shared UI state + poll health telemetry
    let state = DashboardState::new();
    let health = Arc::new(PollHealth::new(256));

    // Opportunity poller; its first fetch fires immediately
    let feed = Arc::new(OpportunityFeed::new(
        config.api.clone(),
        state.clone(),
        health.clone(),
    ));
    feed.start(shutdown_tx.subscribe());

    // === Spawn telemetry summary loop ===
    {
        let health = health.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();
        let period =
            tokio::time::Duration::from_secs(config.telemetry.summary_interval_secs);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = interval.tick() => health.log_summary(),
                    _ = shutdown_rx.recv() => break,
                }
            }
        });
    }

    // === Spawn dashboard HTTP API ===
    {
        let state = state.clone();
        let health = health.clone();
        let shutdown_rx = shutdown_tx.subscribe();

        tokio::spawn(async move {
            server::run_http(bind_addr, state, health, shutdown_rx).await;
        });
    }

    info!("=== CRYPTOSYNTH running ===");
    info!("Dashboard API: http://{bind_addr}");
    info!("Press Ctrl+C to shutdown.");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Cleaning up...");
    let _ = shutdown_tx.send(());

    // Final feed summary
    health.log_summary();

    info!("CRYPTOSYNTH shutdown complete.");
    Ok(())
}
