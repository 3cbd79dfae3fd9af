use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dashboard::state::DashboardState;
use crate::models::opportunity::{BotKind, Opportunity};
use crate::signals::summary::{summarize, MetricSummary};

/// Cell text for a field the record arrived without.
pub const PLACEHOLDER: &str = "—";

/// Table column descriptor handed to the rendering sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Column {
    pub key: &'static str,
    pub header: &'static str,
}

const SIMILARITY_COLUMNS: &[Column] = &[
    Column { key: "timestamp", header: "Timestamp" },
    Column { key: "base_coin", header: "Base Coin" },
    Column { key: "correlated_coin", header: "Correlated Coin" },
    Column { key: "correlation", header: "Correlation" },
];

const ARBITRAGE_COLUMNS: &[Column] = &[
    Column { key: "timestamp", header: "Timestamp" },
    Column { key: "pair", header: "Pair" },
    Column { key: "exchanges", header: "Exchanges" },
    Column { key: "expected_profit", header: "Expected Profit" },
];

/// Column set for a bot's table: the shared timestamp column plus the three
/// variant-specific columns.
pub fn columns(bot: BotKind) -> &'static [Column] {
    match bot {
        BotKind::Similarity => SIMILARITY_COLUMNS,
        BotKind::Arbitrage => ARBITRAGE_COLUMNS,
    }
}

/// One point of the metric time series. `value` is `None` for a record whose
/// metric field was missing; the chart renders a gap there.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
}

/// One fully formatted table row, cell per column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub cells: Vec<String>,
}

/// Everything the rendering sink needs for the active bot, resolved in one
/// pass so the dataset, metric, labels and columns always belong to the same
/// `BotKind`. No partial or mismatched state ever leaves this module.
#[derive(Debug, Clone, Serialize)]
pub struct BotSnapshot {
    pub bot: BotKind,
    pub metric_label: &'static str,
    /// Wire name of the metric field, for chart series keyed by field.
    pub metric_field: &'static str,
    pub columns: &'static [Column],
    /// `None` when the dataset is empty (or no record carried a metric);
    /// serialized as `null`, rendered as a placeholder tile.
    pub stats: Option<MetricSummary>,
    pub points: Vec<ChartPoint>,
    pub rows: Vec<TableRow>,
}

/// Resolve the active selection into a renderable snapshot.
///
/// The selection is read exactly once; only the matching dataset is then
/// consulted, so a toggle landing between the two reads cannot produce a
/// mixed snapshot.
pub async fn resolve(state: &DashboardState) -> BotSnapshot {
    let bot = state.active_bot().await;
    let records: Vec<Opportunity> = match bot {
        BotKind::Similarity => state
            .similarity()
            .await
            .into_iter()
            .map(Opportunity::Similarity)
            .collect(),
        BotKind::Arbitrage => state
            .arbitrage()
            .await
            .into_iter()
            .map(Opportunity::Arbitrage)
            .collect(),
    };
    snapshot_of(bot, &records)
}

fn snapshot_of(bot: BotKind, records: &[Opportunity]) -> BotSnapshot {
    let metrics: Vec<f64> = records.iter().filter_map(Opportunity::metric).collect();
    BotSnapshot {
        bot,
        metric_label: bot.metric_label(),
        metric_field: bot.metric_field(),
        columns: columns(bot),
        stats: summarize(&metrics),
        points: records
            .iter()
            .map(|r| ChartPoint {
                timestamp: r.timestamp(),
                value: r.metric(),
            })
            .collect(),
        rows: records.iter().map(row).collect(),
    }
}

fn row(record: &Opportunity) -> TableRow {
    let timestamp = record
        .timestamp()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    let cells = match record {
        Opportunity::Similarity(o) => vec![
            timestamp,
            text(&o.base_coin),
            text(&o.correlated_coin),
            metric_cell(o.correlation),
        ],
        Opportunity::Arbitrage(o) => vec![
            timestamp,
            text(&o.pair),
            route(&o.sell_exchange, &o.buy_exchange),
            metric_cell(o.expected_profit),
        ],
    };
    TableRow { cells }
}

/// Percent with two decimals, e.g. 0.1234 → "12.34%".
pub fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn metric_cell(value: Option<f64>) -> String {
    value.map(percent).unwrap_or_else(|| PLACEHOLDER.into())
}

fn text(field: &Option<String>) -> String {
    field.clone().unwrap_or_else(|| PLACEHOLDER.into())
}

/// "kraken → binance" style exchange route, degrading per side.
fn route(sell: &Option<String>, buy: &Option<String>) -> String {
    format!(
        "{} → {}",
        sell.as_deref().unwrap_or(PLACEHOLDER),
        buy.as_deref().unwrap_or(PLACEHOLDER)
    )
}
