use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Summary of a bot's primary metric over its current dataset.
///
/// Derived fresh on every view resolution; never cached. Datasets are small
/// (bounded by how many signals a bot reports), so recomputation is cheaper
/// than any staleness bug a cache could introduce.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub average: f64,
    pub max: f64,
    pub min: f64,
}

/// Compute average/max/min over the metric values, in dataset order.
///
/// Returns `None` for an empty input: the mean of zero values is undefined,
/// and the rendering layer shows a placeholder instead of a NaN.
pub fn summarize(values: &[f64]) -> Option<MetricSummary> {
    if values.is_empty() {
        return None;
    }
    Some(MetricSummary {
        average: values.mean(),
        max: values.max(),
        min: values.min(),
    })
}
