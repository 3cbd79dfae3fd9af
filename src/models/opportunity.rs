use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which bot a dataset (and everything derived from it) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotKind {
    Similarity,
    Arbitrage,
}

impl BotKind {
    /// Heading used for the stat tiles and the chart series.
    pub fn metric_label(&self) -> &'static str {
        match self {
            BotKind::Similarity => "Correlation",
            BotKind::Arbitrage => "Profit",
        }
    }

    /// Wire name of the primary numeric field summarized for this bot.
    pub fn metric_field(&self) -> &'static str {
        match self {
            BotKind::Similarity => "correlation",
            BotKind::Arbitrage => "expected_profit",
        }
    }

    /// The other bot. The dashboard only ever oscillates between the two.
    pub fn toggled(&self) -> BotKind {
        match self {
            BotKind::Similarity => BotKind::Arbitrage,
            BotKind::Arbitrage => BotKind::Similarity,
        }
    }
}

impl std::fmt::Display for BotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BotKind::Similarity => write!(f, "similarity"),
            BotKind::Arbitrage => write!(f, "arbitrage"),
        }
    }
}

/// One detected pair-correlation signal from the similarity bot.
///
/// Everything except the timestamp is optional: a record missing a field is
/// still shown, with placeholder cells, instead of failing the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityOpportunity {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub base_coin: Option<String>,
    #[serde(default)]
    pub correlated_coin: Option<String>,
    /// Pearson correlation, nominally in [-1, 1]. Not range-checked here.
    #[serde(default)]
    pub correlation: Option<f64>,
}

/// One detected cross-exchange spread from the arbitrage bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrageOpportunity {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub pair: Option<String>,
    #[serde(default)]
    pub sell_exchange: Option<String>,
    #[serde(default)]
    pub buy_exchange: Option<String>,
    /// Fractional profit estimate, e.g. 0.02 = 2%.
    #[serde(default)]
    pub expected_profit: Option<f64>,
}

/// A single opportunity, tagged by the bot that produced it.
///
/// The two variants never mix inside one dataset: each bot's dataset is a
/// homogeneous `Vec` of its own record type, and this enum only exists as
/// the uniform per-record view handed to the rendering layer.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Opportunity {
    Similarity(SimilarityOpportunity),
    Arbitrage(ArbitrageOpportunity),
}

impl Opportunity {
    pub fn kind(&self) -> BotKind {
        match self {
            Opportunity::Similarity(_) => BotKind::Similarity,
            Opportunity::Arbitrage(_) => BotKind::Arbitrage,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Opportunity::Similarity(o) => o.timestamp,
            Opportunity::Arbitrage(o) => o.timestamp,
        }
    }

    /// The bot's primary metric: correlation or expected profit.
    /// `None` when the record arrived without it.
    pub fn metric(&self) -> Option<f64> {
        match self {
            Opportunity::Similarity(o) => o.correlation,
            Opportunity::Arbitrage(o) => o.expected_profit,
        }
    }
}
