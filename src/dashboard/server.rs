use std::net::SocketAddr;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::info;
use warp::Filter;

use crate::dashboard::state::DashboardState;
use crate::dashboard::view;
use crate::models::opportunity::BotKind;
use crate::telemetry::poll_health::PollHealth;

#[derive(Debug, Deserialize)]
struct SelectBody {
    bot: BotKind,
}

/// The dashboard HTTP API.
///
/// The frontend only ever sees resolved snapshots: the active bot's dataset,
/// stats, labels and columns in one consistent payload. Selection changes go
/// through here too, so the toggle and the re-derivation are one round trip.
pub fn routes(
    state: Arc<DashboardState>,
    health: Arc<PollHealth>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let state_filter = warp::any().map(move || state.clone());
    let health_filter = warp::any().map(move || health.clone());

    let root = warp::get().and(warp::path::end()).map(|| {
        warp::reply::json(&serde_json::json!({
            "message": "CryptoSynth dashboard is running"
        }))
    });

    let api_dashboard = warp::get()
        .and(warp::path!("api" / "dashboard"))
        .and(state_filter.clone())
        .and_then(|state: Arc<DashboardState>| async move {
            let snapshot = view::resolve(&state).await;
            Ok::<_, warp::Rejection>(warp::reply::json(&snapshot))
        });

    let api_health = warp::get()
        .and(warp::path!("api" / "health"))
        .and(health_filter)
        .map(|health: Arc<PollHealth>| warp::reply::json(&health.snapshot()));

    let api_toggle = warp::post()
        .and(warp::path!("api" / "active" / "toggle"))
        .and(state_filter.clone())
        .and_then(|state: Arc<DashboardState>| async move {
            let active = state.toggle().await;
            info!("Active bot toggled to {active}");
            let snapshot = view::resolve(&state).await;
            Ok::<_, warp::Rejection>(warp::reply::json(&snapshot))
        });

    let api_select = warp::put()
        .and(warp::path!("api" / "active"))
        .and(warp::body::json())
        .and(state_filter)
        .and_then(|body: SelectBody, state: Arc<DashboardState>| async move {
            state.set_active(body.bot).await;
            let snapshot = view::resolve(&state).await;
            Ok::<_, warp::Rejection>(warp::reply::json(&snapshot))
        });

    api_dashboard
        .or(api_health)
        .or(api_toggle)
        .or(api_select)
        .or(root)
}

/// Serve the API until the shutdown signal fires.
pub async fn run_http(
    addr: SocketAddr,
    state: Arc<DashboardState>,
    health: Arc<PollHealth>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let routes = routes(state, health);

    info!("Dashboard API listening on http://{addr}");
    let (_addr, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async move {
        let _ = shutdown.recv().await;
    });
    server.await;
    info!("Dashboard API stopped");
}
