use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::opportunity::{ArbitrageOpportunity, BotKind, SimilarityOpportunity};

/// Shared dashboard state: one dataset per bot plus the active selection.
///
/// This is the only mutable state in the system. The opportunity feed is the
/// sole writer of the datasets (wholesale replacement per successful poll);
/// the HTTP toggle handlers are the sole writer of the selection. Everything
/// downstream derives from read-only snapshots.
pub struct DashboardState {
    similarity: RwLock<Vec<SimilarityOpportunity>>,
    arbitrage: RwLock<Vec<ArbitrageOpportunity>>,
    active: RwLock<BotKind>,
}

impl DashboardState {
    /// Fresh state: both datasets empty, similarity bot selected.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            similarity: RwLock::new(Vec::new()),
            arbitrage: RwLock::new(Vec::new()),
            active: RwLock::new(BotKind::Similarity),
        })
    }

    /// Replace the similarity dataset with a freshly polled one.
    /// Prior contents are discarded, not merged.
    pub async fn replace_similarity(&self, opportunities: Vec<SimilarityOpportunity>) {
        *self.similarity.write().await = opportunities;
    }

    /// Replace the arbitrage dataset with a freshly polled one.
    pub async fn replace_arbitrage(&self, opportunities: Vec<ArbitrageOpportunity>) {
        *self.arbitrage.write().await = opportunities;
    }

    /// Snapshot of the similarity dataset, in poll order.
    pub async fn similarity(&self) -> Vec<SimilarityOpportunity> {
        self.similarity.read().await.clone()
    }

    /// Snapshot of the arbitrage dataset, in poll order.
    pub async fn arbitrage(&self) -> Vec<ArbitrageOpportunity> {
        self.arbitrage.read().await.clone()
    }

    pub async fn active_bot(&self) -> BotKind {
        *self.active.read().await
    }

    pub async fn set_active(&self, bot: BotKind) {
        *self.active.write().await = bot;
    }

    /// Flip the selection to the other bot and return the new value.
    pub async fn toggle(&self) -> BotKind {
        let mut active = self.active.write().await;
        *active = active.toggled();
        *active
    }
}
