use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::info;

use crate::models::opportunity::BotKind;

/// Per-bot health of the opportunity polling.
///
/// A failing feed never surfaces as an error state in the dashboard; the
/// data just goes stale. This tracker is what makes that staleness visible:
/// last successful poll, consecutive failures, and fetch latencies over a
/// bounded sample window.
pub struct PollHealth {
    feeds: DashMap<BotKind, FeedHealth>,
    max_samples: usize,
}

#[derive(Debug, Default)]
struct FeedHealth {
    last_success: Option<DateTime<Utc>>,
    last_count: usize,
    consecutive_failures: u32,
    total_polls: u64,
    total_failures: u64,
    latencies: VecDeque<Duration>,
}

/// Serializable health report, one entry per bot.
#[derive(Debug, Clone, Serialize)]
pub struct FeedReport {
    pub bot: BotKind,
    pub last_success: Option<DateTime<Utc>>,
    pub last_count: usize,
    pub consecutive_failures: u32,
    pub total_polls: u64,
    pub total_failures: u64,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
}

impl PollHealth {
    pub fn new(max_samples: usize) -> Self {
        Self {
            feeds: DashMap::new(),
            max_samples,
        }
    }

    /// Record a successful poll: latency sample plus dataset size.
    pub fn record_success(&self, bot: BotKind, latency: Duration, count: usize) {
        let max = self.max_samples;
        let mut entry = self.feeds.entry(bot).or_default();
        entry.last_success = Some(Utc::now());
        entry.last_count = count;
        entry.consecutive_failures = 0;
        entry.total_polls += 1;
        if entry.latencies.len() >= max {
            entry.latencies.pop_front();
        }
        entry.latencies.push_back(latency);
    }

    /// Record a failed poll. The dataset stays stale; only the counters move.
    pub fn record_failure(&self, bot: BotKind) {
        let mut entry = self.feeds.entry(bot).or_default();
        entry.consecutive_failures += 1;
        entry.total_polls += 1;
        entry.total_failures += 1;
    }

    pub fn consecutive_failures(&self, bot: BotKind) -> u32 {
        self.feeds
            .get(&bot)
            .map(|e| e.consecutive_failures)
            .unwrap_or(0)
    }

    pub fn last_success(&self, bot: BotKind) -> Option<DateTime<Utc>> {
        self.feeds.get(&bot).and_then(|e| e.last_success)
    }

    /// p50/p95 fetch latency for a bot's feed over the sample window.
    pub fn percentiles(&self, bot: BotKind) -> Option<(Duration, Duration)> {
        let entry = self.feeds.get(&bot)?;
        if entry.latencies.is_empty() {
            return None;
        }
        let mut sorted: Vec<Duration> = entry.latencies.iter().copied().collect();
        sorted.sort();
        let len = sorted.len();
        let p50 = sorted[len / 2];
        let p95 = sorted[((len as f64 * 0.95) as usize).min(len - 1)];
        Some((p50, p95))
    }

    /// Serializable report for the health endpoint, one entry per bot.
    pub fn snapshot(&self) -> Vec<FeedReport> {
        [BotKind::Similarity, BotKind::Arbitrage]
            .into_iter()
            .map(|bot| {
                let (p50_ms, p95_ms) = match self.percentiles(bot) {
                    Some((p50, p95)) => (
                        Some(p50.as_secs_f64() * 1000.0),
                        Some(p95.as_secs_f64() * 1000.0),
                    ),
                    None => (None, None),
                };
                let entry = self.feeds.get(&bot);
                FeedReport {
                    bot,
                    last_success: entry.as_ref().and_then(|e| e.last_success),
                    last_count: entry.as_ref().map(|e| e.last_count).unwrap_or(0),
                    consecutive_failures: entry
                        .as_ref()
                        .map(|e| e.consecutive_failures)
                        .unwrap_or(0),
                    total_polls: entry.as_ref().map(|e| e.total_polls).unwrap_or(0),
                    total_failures: entry.as_ref().map(|e| e.total_failures).unwrap_or(0),
                    p50_ms,
                    p95_ms,
                }
            })
            .collect()
    }

    /// Log one summary line per feed.
    pub fn log_summary(&self) {
        for report in self.snapshot() {
            info!(
                "Feed [{}]: polls={} failures={} streak={} last_count={} p50={}ms p95={}ms",
                report.bot,
                report.total_polls,
                report.total_failures,
                report.consecutive_failures,
                report.last_count,
                report
                    .p50_ms
                    .map(|ms| format!("{ms:.0}"))
                    .unwrap_or_else(|| "-".into()),
                report
                    .p95_ms
                    .map(|ms| format!("{ms:.0}"))
                    .unwrap_or_else(|| "-".into()),
            );
        }
    }
}
