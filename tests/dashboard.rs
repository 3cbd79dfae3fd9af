//! Integration tests for the dashboard core: polling against a stub bot API,
//! dataset replacement semantics, view resolution and the toggle flow.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use warp::Filter;

use cryptosynth::config::ApiConfig;
use cryptosynth::dashboard::{server, view, DashboardState};
use cryptosynth::feeds::opportunities::OpportunityFeed;
use cryptosynth::models::opportunity::{ArbitrageOpportunity, BotKind, SimilarityOpportunity};
use cryptosynth::telemetry::poll_health::PollHealth;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Serve a stub bot API on an ephemeral local port.
fn serve<F>(routes: F) -> SocketAddr
where
    F: warp::Filter<Error = warp::Rejection> + Clone + Send + Sync + 'static,
    F::Extract: warp::Reply,
{
    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    addr
}

fn similarity_route(
    body: serde_json::Value,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("api" / "similarity" / "opportunities").map(move || warp::reply::json(&body))
}

fn arbitrage_route(
    body: serde_json::Value,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("api" / "arbitrage" / "opportunities").map(move || warp::reply::json(&body))
}

fn make_feed(
    addr: SocketAddr,
    state: Arc<DashboardState>,
    health: Arc<PollHealth>,
) -> OpportunityFeed {
    let config = ApiConfig {
        base_url: format!("http://{addr}"),
        poll_interval_ms: 5000,
        request_timeout_secs: 2,
    };
    OpportunityFeed::new(config, state, health)
}

fn stale_similarity() -> SimilarityOpportunity {
    SimilarityOpportunity {
        timestamp: Utc::now(),
        base_coin: Some("OLD".into()),
        correlated_coin: Some("OLD".into()),
        correlation: Some(0.01),
    }
}

fn stale_arbitrage() -> ArbitrageOpportunity {
    ArbitrageOpportunity {
        timestamp: Utc::now(),
        pair: Some("OLD/OLD".into()),
        sell_exchange: Some("old".into()),
        buy_exchange: Some("old".into()),
        expected_profit: Some(0.001),
    }
}

// ---------------------------------------------------------------------------
// Poller semantics
// ---------------------------------------------------------------------------

/// A successful poll replaces a bot's dataset wholesale, in payload order.
#[tokio::test]
async fn test_successful_poll_replaces_dataset_wholesale() {
    let addr = serve(
        similarity_route(serde_json::json!([
            {"timestamp": "2024-05-01T12:00:00Z", "base_coin": "BTC",
             "correlated_coin": "ETH", "correlation": 0.9},
            {"timestamp": "2024-05-01T12:00:05Z", "base_coin": "SOL",
             "correlated_coin": "XRP", "correlation": 0.4}
        ]))
        .or(arbitrage_route(serde_json::json!([]))),
    );

    let state = DashboardState::new();
    state
        .replace_similarity(vec![stale_similarity(), stale_similarity(), stale_similarity()])
        .await;

    let feed = make_feed(addr, state.clone(), Arc::new(PollHealth::new(16)));
    feed.poll_once().await;

    let dataset = state.similarity().await;
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset[0].base_coin.as_deref(), Some("BTC"));
    assert_eq!(dataset[0].correlation, Some(0.9));
    assert_eq!(dataset[1].correlation, Some(0.4));
}

/// One bot's fetch failing must not block the other's update, nor touch the
/// failing bot's last good dataset.
#[tokio::test]
async fn test_failed_fetch_leaves_dataset_stale() {
    let addr = serve(
        similarity_route(serde_json::json!([
            {"timestamp": "2024-05-01T12:00:00Z", "base_coin": "BTC",
             "correlated_coin": "ETH", "correlation": 0.5}
        ]))
        .or(warp::path!("api" / "arbitrage" / "opportunities").map(|| {
            warp::reply::with_status("boom", warp::http::StatusCode::INTERNAL_SERVER_ERROR)
        })),
    );

    let state = DashboardState::new();
    state.replace_arbitrage(vec![stale_arbitrage()]).await;

    let health = Arc::new(PollHealth::new(16));
    let feed = make_feed(addr, state.clone(), health.clone());
    feed.poll_once().await;

    // Similarity updated, arbitrage untouched.
    assert_eq!(state.similarity().await.len(), 1);
    let arbitrage = state.arbitrage().await;
    assert_eq!(arbitrage.len(), 1);
    assert_eq!(arbitrage[0].pair.as_deref(), Some("OLD/OLD"));

    assert_eq!(health.consecutive_failures(BotKind::Arbitrage), 1);
    assert_eq!(health.consecutive_failures(BotKind::Similarity), 0);
}

/// An undecodable body is a fetch failure, contained the same way.
#[tokio::test]
async fn test_malformed_payload_is_contained() {
    let addr = serve(
        warp::path!("api" / "similarity" / "opportunities")
            .map(|| "definitely not json")
            .or(arbitrage_route(serde_json::json!([]))),
    );

    let state = DashboardState::new();
    state.replace_similarity(vec![stale_similarity()]).await;

    let health = Arc::new(PollHealth::new(16));
    let feed = make_feed(addr, state.clone(), health.clone());
    feed.poll_once().await;

    let dataset = state.similarity().await;
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset[0].base_coin.as_deref(), Some("OLD"));
    assert_eq!(health.consecutive_failures(BotKind::Similarity), 1);
}

/// The poll loop's first tick fires immediately, not an interval later.
#[tokio::test]
async fn test_poll_loop_populates_at_startup() {
    let addr = serve(
        similarity_route(serde_json::json!([
            {"timestamp": "2024-05-01T12:00:00Z", "base_coin": "BTC",
             "correlated_coin": "ETH", "correlation": 0.3}
        ]))
        .or(arbitrage_route(serde_json::json!([]))),
    );

    let state = DashboardState::new();
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);
    let feed = Arc::new(make_feed(addr, state.clone(), Arc::new(PollHealth::new(16))));
    feed.start(shutdown_tx.subscribe());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(state.similarity().await.len(), 1);

    let _ = shutdown_tx.send(());
}

/// A response arriving after teardown must not mutate state.
#[tokio::test]
async fn test_shutdown_drops_in_flight_poll() {
    let slow = warp::path!("api" / String / "opportunities").and_then(|_bot: String| async {
        tokio::time::sleep(Duration::from_millis(400)).await;
        Ok::<_, warp::Rejection>(warp::reply::json(&serde_json::json!([
            {"timestamp": "2024-05-01T12:00:00Z", "correlation": 0.8}
        ])))
    });
    let addr = serve(slow);

    let state = DashboardState::new();
    let health = Arc::new(PollHealth::new(16));
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);
    let feed = Arc::new(make_feed(addr, state.clone(), health.clone()));
    feed.start(shutdown_tx.subscribe());

    // Let the immediate tick get in flight, then tear down before it lands.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let _ = shutdown_tx.send(());
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert!(state.similarity().await.is_empty());
    assert!(state.arbitrage().await.is_empty());
    assert!(health.last_success(BotKind::Similarity).is_none());
}

// ---------------------------------------------------------------------------
// End-to-end: poll → view → toggle
// ---------------------------------------------------------------------------

/// Full walkthrough: the immediate fetch lands one similarity record and an
/// empty arbitrage dataset; initial view shows the similarity stats and one
/// row; toggling shows zero rows and the empty-stats placeholder.
#[tokio::test]
async fn test_mount_poll_toggle_scenario() {
    let addr = serve(
        similarity_route(serde_json::json!([
            {"timestamp": "2024-05-01T12:00:00Z", "base_coin": "BTC",
             "correlated_coin": "ETH", "correlation": 0.3}
        ]))
        .or(arbitrage_route(serde_json::json!([]))),
    );

    let state = DashboardState::new();
    let health = Arc::new(PollHealth::new(16));
    let feed = make_feed(addr, state.clone(), health.clone());
    feed.poll_once().await;

    let snapshot = view::resolve(&state).await;
    assert_eq!(snapshot.bot, BotKind::Similarity);
    let stats = snapshot.stats.expect("one record should yield stats");
    assert_eq!(stats.average, 0.3);
    assert_eq!(stats.max, 0.3);
    assert_eq!(stats.min, 0.3);
    assert_eq!(snapshot.rows.len(), 1);

    // User toggles to the arbitrage bot via the HTTP surface.
    let routes = server::routes(state.clone(), health);
    let resp = warp::test::request()
        .method("POST")
        .path("/api/active/toggle")
        .reply(&routes)
        .await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(body["bot"], "arbitrage");
    assert_eq!(body["metric_label"], "Profit");
    assert!(body["stats"].is_null());
    assert_eq!(body["rows"].as_array().unwrap().len(), 0);
}

/// Toggling twice restores the original resolved view unchanged.
#[tokio::test]
async fn test_double_toggle_is_identity() {
    let addr = serve(
        similarity_route(serde_json::json!([
            {"timestamp": "2024-05-01T12:00:00Z", "base_coin": "BTC",
             "correlated_coin": "ETH", "correlation": 0.2},
            {"timestamp": "2024-05-01T12:00:05Z", "base_coin": "BTC",
             "correlated_coin": "SOL", "correlation": 0.5},
            {"timestamp": "2024-05-01T12:00:10Z", "base_coin": "ETH",
             "correlated_coin": "XRP", "correlation": -0.1}
        ]))
        .or(arbitrage_route(serde_json::json!([]))),
    );

    let state = DashboardState::new();
    let feed = make_feed(addr, state.clone(), Arc::new(PollHealth::new(16)));
    feed.poll_once().await;

    let before = view::resolve(&state).await;
    let stats = before.stats.expect("stats over three records");
    assert!((stats.average - 0.2).abs() < 1e-12);
    assert_eq!(stats.max, 0.5);
    assert_eq!(stats.min, -0.1);

    state.toggle().await;
    state.toggle().await;
    let after = view::resolve(&state).await;

    assert_eq!(before.bot, after.bot);
    assert_eq!(before.stats, after.stats);
    assert_eq!(before.rows, after.rows);
    assert_eq!(before.points, after.points);
}
