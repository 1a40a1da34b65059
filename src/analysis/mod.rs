/// Analysis layer: the aggregation views computed from a `FilteredView`.
///
/// Every function here is pure and recomputed in full per invocation; the
/// outputs are ephemeral, consumed by one chart and dropped.
///
/// * `aggregate` – group-by sums/means, time series, the state×category
///   pivot, and the headline KPIs
/// * `stats` – Pearson correlations, box-chart summaries, OLS trendlines,
///   the rolling forecast, and z-score anomalies

pub mod aggregate;
pub mod stats;
