use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::ApiConfig;
use crate::dashboard::state::DashboardState;
use crate::models::opportunity::{ArbitrageOpportunity, BotKind, SimilarityOpportunity};
use crate::telemetry::poll_health::PollHealth;

/// Why a single poll request produced no dataset update.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("undecodable payload: {0}")]
    Decode(reqwest::Error),
}

/// Polls the bot API for both opportunity datasets.
///
/// Each tick issues one request per bot, concurrently. A successful response
/// replaces that bot's dataset wholesale; a failed one leaves it stale and
/// moves the health counters. There is no retry inside a tick; the next
/// tick is the retry.
pub struct OpportunityFeed {
    config: ApiConfig,
    state: Arc<DashboardState>,
    health: Arc<PollHealth>,
    http: reqwest::Client,
}

impl OpportunityFeed {
    pub fn new(config: ApiConfig, state: Arc<DashboardState>, health: Arc<PollHealth>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            config,
            state,
            health,
            http,
        }
    }

    /// Start the poll loop. Spawned exactly once from main; stops on the
    /// shutdown signal. The first tick fires immediately so the dashboard is
    /// populated without waiting a full interval.
    pub fn start(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_millis(
                self.config.poll_interval_ms,
            ));
            info!(
                "Opportunity feed polling {} every {}ms",
                self.config.base_url, self.config.poll_interval_ms
            );

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        // Racing the in-flight poll against shutdown drops a
                        // late response instead of writing it into torn-down
                        // state.
                        tokio::select! {
                            _ = self.poll_once() => {}
                            _ = shutdown.recv() => {
                                info!("Opportunity feed shutdown, in-flight poll dropped");
                                return;
                            }
                        }
                    }
                    _ = shutdown.recv() => {
                        info!("Opportunity feed shutdown");
                        return;
                    }
                }
            }
        });
    }

    /// One poll round: fetch both datasets concurrently and apply whatever
    /// succeeded. One bot failing never blocks or rolls back the other.
    pub async fn poll_once(&self) {
        let (similarity, arbitrage) = futures_util::join!(
            self.fetch_dataset::<SimilarityOpportunity>(BotKind::Similarity),
            self.fetch_dataset::<ArbitrageOpportunity>(BotKind::Arbitrage),
        );

        if let Ok(batch) = similarity {
            self.state.replace_similarity(batch).await;
        }
        if let Ok(batch) = arbitrage {
            self.state.replace_arbitrage(batch).await;
        }
    }

    /// Fetch one bot's opportunity list, recording outcome and latency.
    async fn fetch_dataset<T: DeserializeOwned>(
        &self,
        bot: BotKind,
    ) -> Result<Vec<T>, FetchError> {
        let started = Instant::now();
        let result = self.fetch::<T>(bot).await;
        match &result {
            Ok(batch) => {
                self.health.record_success(bot, started.elapsed(), batch.len());
                debug!("Fetched {} {bot} opportunities", batch.len());
            }
            Err(e) => {
                self.health.record_failure(bot);
                warn!(
                    "{bot} opportunities fetch failed: {e} — dataset stays at last good value \
                     (streak: {})",
                    self.health.consecutive_failures(bot)
                );
            }
        }
        result
    }

    async fn fetch<T: DeserializeOwned>(&self, bot: BotKind) -> Result<Vec<T>, FetchError> {
        let url = self.endpoint(bot);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        response.json::<Vec<T>>().await.map_err(FetchError::Decode)
    }

    fn endpoint(&self, bot: BotKind) -> String {
        format!(
            "{}/api/{bot}/opportunities",
            self.config.base_url.trim_end_matches('/')
        )
    }
}
