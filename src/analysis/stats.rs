use std::collections::BTreeMap;

use crate::data::filter::FilteredView;
use crate::data::model::{Month, SalesRecord};

// ---------------------------------------------------------------------------
// Numeric columns – the measures correlation and scatter views operate on
// ---------------------------------------------------------------------------

/// The numeric measures derived from a record. Column order here fixes the
/// row/column order of the correlation matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericColumn {
    TotalSales,
    ReviewRating,
    DeliveredFlag,
    Satisfied,
    LogTotalSales,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 5] = [
        NumericColumn::TotalSales,
        NumericColumn::ReviewRating,
        NumericColumn::DeliveredFlag,
        NumericColumn::Satisfied,
        NumericColumn::LogTotalSales,
    ];

    pub fn label(self) -> &'static str {
        match self {
            NumericColumn::TotalSales => "Total_Sales_INR",
            NumericColumn::ReviewRating => "Review_Rating",
            NumericColumn::DeliveredFlag => "Delivered_Flag",
            NumericColumn::Satisfied => "Satisfied",
            NumericColumn::LogTotalSales => "Log_Total_Sales",
        }
    }

    pub fn value(self, record: &SalesRecord) -> f64 {
        match self {
            NumericColumn::TotalSales => record.total_sales_inr,
            NumericColumn::ReviewRating => record.review_rating,
            NumericColumn::DeliveredFlag => f64::from(record.delivered_flag),
            NumericColumn::Satisfied => f64::from(record.satisfied),
            NumericColumn::LogTotalSales => record.log_total_sales,
        }
    }
}

/// The scatter panes shown in the diagnostics section, as (x, y) pairs.
pub const SCATTER_PAIRS: [(NumericColumn, NumericColumn); 4] = [
    (NumericColumn::LogTotalSales, NumericColumn::ReviewRating),
    (NumericColumn::LogTotalSales, NumericColumn::Satisfied),
    (NumericColumn::ReviewRating, NumericColumn::Satisfied),
    (NumericColumn::DeliveredFlag, NumericColumn::Satisfied),
];

// ---------------------------------------------------------------------------
// Basic moments
// ---------------------------------------------------------------------------

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1 denominator); NaN for fewer than 2
/// values, 0 for a constant series.
fn sample_std(values: &[f64], m: f64) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Pearson correlation coefficient; NaN when either series is empty or has
/// zero variance.
fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.is_empty() || xs.len() != ys.len() {
        return f64::NAN;
    }
    let mx = mean(xs);
    let my = mean(ys);

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        f64::NAN
    } else {
        cov / denom
    }
}

// ---------------------------------------------------------------------------
// Correlation matrix
// ---------------------------------------------------------------------------

/// Pairwise Pearson correlations over the five numeric measures. Symmetric;
/// diagonal entries are 1.0 unless that column is constant across the view,
/// in which case its whole row and column (diagonal included) are NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: [&'static str; 5],
    pub values: [[f64; 5]; 5],
}

pub fn correlation_matrix(view: &FilteredView<'_>) -> CorrelationMatrix {
    let series: Vec<Vec<f64>> = NumericColumn::ALL
        .iter()
        .map(|col| view.records().map(|r| col.value(r)).collect())
        .collect();

    let mut values = [[f64::NAN; 5]; 5];
    for i in 0..5 {
        for j in i..5 {
            let r = pearson(&series[i], &series[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        columns: NumericColumn::ALL.map(NumericColumn::label),
        values,
    }
}

// ---------------------------------------------------------------------------
// Rating summary (box-chart five-number statistics)
// ---------------------------------------------------------------------------

/// Min / quartiles / max of a rating sample, quantiles by linear
/// interpolation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Linearly interpolated quantile of a sorted slice, `q` in `[0, 1]`.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

impl RatingSummary {
    /// None for an empty sample.
    pub fn from_values(mut values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);
        Some(RatingSummary {
            min: values[0],
            q1: quantile(&values, 0.25),
            median: quantile(&values, 0.5),
            q3: quantile(&values, 0.75),
            max: values[values.len() - 1],
        })
    }
}

// ---------------------------------------------------------------------------
// Scatter diagnostics with OLS trendline
// ---------------------------------------------------------------------------

/// `y = intercept + slope * x`, fitted by ordinary least squares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trendline {
    pub slope: f64,
    pub intercept: f64,
}

impl Trendline {
    pub fn y_at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// None for fewer than two points or a vertical (zero x-variance) cloud.
pub fn ols_trendline(points: &[[f64; 2]]) -> Option<Trendline> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mx = points.iter().map(|p| p[0]).sum::<f64>() / n;
    let my = points.iter().map(|p| p[1]).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    for p in points {
        cov += (p[0] - mx) * (p[1] - my);
        var_x += (p[0] - mx).powi(2);
    }
    if var_x == 0.0 {
        return None;
    }
    let slope = cov / var_x;
    Some(Trendline {
        slope,
        intercept: my - slope * mx,
    })
}

/// Scatter points for an (x, y) measure pair, grouped by product category so
/// the chart can color each category separately.
pub fn scatter_by_category(
    view: &FilteredView<'_>,
    x: NumericColumn,
    y: NumericColumn,
) -> Vec<(String, Vec<[f64; 2]>)> {
    let mut groups: BTreeMap<String, Vec<[f64; 2]>> = BTreeMap::new();
    for r in view.records() {
        groups
            .entry(r.product_category.clone())
            .or_default()
            .push([x.value(r), y.value(r)]);
    }
    groups.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Rolling forecast
// ---------------------------------------------------------------------------

/// Trailing window for the moving-average trend.
pub const ROLLING_WINDOW: usize = 3;

/// Naive growth applied to the last trailing mean for the three forecast
/// periods: +2 %, +4 %, +6 %. Not a fitted model.
pub const FORECAST_GROWTH: [f64; 3] = [1.02, 1.04, 1.06];

/// Trailing 3-month means of monthly revenue plus three extrapolated
/// periods. The first two months have no defined trailing mean and are
/// dropped; with fewer than three months both parts are empty.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingForecast {
    pub trailing: Vec<(Month, f64)>,
    pub forecast: Vec<f64>,
}

pub fn rolling_forecast(monthly: &[(Month, f64)]) -> RollingForecast {
    if monthly.len() < ROLLING_WINDOW {
        return RollingForecast {
            trailing: Vec::new(),
            forecast: Vec::new(),
        };
    }

    let trailing: Vec<(Month, f64)> = monthly
        .windows(ROLLING_WINDOW)
        .map(|w| {
            let sum: f64 = w.iter().map(|(_, v)| v).sum();
            (w[ROLLING_WINDOW - 1].0, sum / ROLLING_WINDOW as f64)
        })
        .collect();

    let last = trailing[trailing.len() - 1].1;
    let forecast = FORECAST_GROWTH.iter().map(|g| last * g).collect();

    RollingForecast { trailing, forecast }
}

// ---------------------------------------------------------------------------
// Z-score anomalies
// ---------------------------------------------------------------------------

/// A sale is anomalous when |z| exceeds this.
pub const Z_THRESHOLD: f64 = 2.0;

/// A flagged sale: its index into the full dataset plus the z-score that
/// triggered the flag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anomaly {
    pub dataset_index: usize,
    pub z_score: f64,
}

/// Rows whose sales z-score (sample std over the view) exceeds the
/// threshold. Empty when the view has fewer than two rows or zero standard
/// deviation — the z-score is undefined there, not an error.
pub fn anomalies(view: &FilteredView<'_>) -> Vec<Anomaly> {
    let sales: Vec<f64> = view.records().map(|r| r.total_sales_inr).collect();
    if sales.len() < 2 {
        return Vec::new();
    }
    let m = mean(&sales);
    let std = sample_std(&sales, m);
    if !std.is_finite() || std == 0.0 {
        return Vec::new();
    }

    view.indexed_records()
        .filter_map(|(idx, r)| {
            let z = (r.total_sales_inr - m) / std;
            (z.abs() > Z_THRESHOLD).then_some(Anomaly {
                dataset_index: idx,
                z_score: z,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{filtered_indices, FilterSelection, FilteredView};
    use crate::data::model::{SalesDataset, SalesRecord};
    use chrono::NaiveDate;

    fn record(m: u32, sales: f64, rating: f64, status: &str) -> SalesRecord {
        SalesRecord::new(
            NaiveDate::from_ymd_opt(2025, m, 5).unwrap(),
            "A".into(),
            "S".into(),
            "P".into(),
            sales,
            rating,
            status.into(),
        )
    }

    fn full_view(ds: &SalesDataset) -> Vec<usize> {
        filtered_indices(ds, &FilterSelection::all(ds))
    }

    #[test]
    fn pearson_detects_perfect_correlation() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&xs, &ys) - 1.0).abs() < 1e-12);

        let neg: Vec<f64> = ys.iter().map(|y| -y).collect();
        assert!((pearson(&xs, &neg) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_is_nan_without_variance() {
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_nan());
        assert!(pearson(&[], &[]).is_nan());
    }

    #[test]
    fn correlation_matrix_is_symmetric_with_unit_diagonal() {
        let ds = SalesDataset::from_records(vec![
            record(1, 100.0, 5.0, "Delivered"),
            record(2, 300.0, 3.0, "Returned"),
            record(3, 250.0, 4.0, "Delivered"),
        ]);
        let indices = full_view(&ds);
        let m = correlation_matrix(&FilteredView::new(&ds, &indices));

        for i in 0..5 {
            assert!(
                (m.values[i][i] - 1.0).abs() < 1e-12,
                "diagonal {i} not 1.0: {}",
                m.values[i][i]
            );
            for j in 0..5 {
                let a = m.values[i][j];
                let b = m.values[j][i];
                assert!(a == b || (a.is_nan() && b.is_nan()));
            }
        }
    }

    #[test]
    fn constant_column_yields_nan_rows() {
        // Every record delivered → Delivered_Flag has zero variance.
        let ds = SalesDataset::from_records(vec![
            record(1, 100.0, 5.0, "Delivered"),
            record(2, 300.0, 3.0, "Delivered"),
        ]);
        let indices = full_view(&ds);
        let m = correlation_matrix(&FilteredView::new(&ds, &indices));

        let flag_idx = 2; // Delivered_Flag position in NumericColumn::ALL
        assert_eq!(m.columns[flag_idx], "Delivered_Flag");
        for j in 0..5 {
            assert!(m.values[flag_idx][j].is_nan());
            assert!(m.values[j][flag_idx].is_nan());
        }
        // Non-constant columns still correlate normally.
        assert!((m.values[0][0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rating_summary_uses_interpolated_quartiles() {
        let s = RatingSummary::from_values(vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(s.min, 1.0);
        assert_eq!(s.q1, 2.0);
        assert_eq!(s.median, 3.0);
        assert_eq!(s.q3, 4.0);
        assert_eq!(s.max, 5.0);

        let s = RatingSummary::from_values(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(s.q1, 1.75);
        assert_eq!(s.median, 2.5);
        assert_eq!(s.q3, 3.25);

        assert!(RatingSummary::from_values(Vec::new()).is_none());
    }

    #[test]
    fn ols_recovers_a_line() {
        let points = [[0.0, 1.0], [1.0, 3.0], [2.0, 5.0]];
        let t = ols_trendline(&points).unwrap();
        assert!((t.slope - 2.0).abs() < 1e-12);
        assert!((t.intercept - 1.0).abs() < 1e-12);
        assert!((t.y_at(10.0) - 21.0).abs() < 1e-12);
    }

    #[test]
    fn ols_is_undefined_for_degenerate_clouds() {
        assert!(ols_trendline(&[[1.0, 2.0]]).is_none());
        assert!(ols_trendline(&[[1.0, 2.0], [1.0, 5.0]]).is_none());
    }

    #[test]
    fn rolling_forecast_matches_worked_example() {
        use crate::data::model::Month::*;
        let monthly = vec![
            (Jan, 100.0),
            (Feb, 200.0),
            (Mar, 300.0),
            (Apr, 400.0),
            (May, 500.0),
        ];
        let rf = rolling_forecast(&monthly);
        assert_eq!(
            rf.trailing,
            vec![(Mar, 200.0), (Apr, 300.0), (May, 400.0)]
        );
        assert_eq!(rf.forecast, vec![400.0 * 1.02, 400.0 * 1.04, 400.0 * 1.06]);
    }

    #[test]
    fn rolling_forecast_needs_three_months() {
        use crate::data::model::Month::*;
        let rf = rolling_forecast(&[(Jan, 100.0), (Feb, 200.0)]);
        assert!(rf.trailing.is_empty());
        assert!(rf.forecast.is_empty());
    }

    #[test]
    fn anomalies_flag_extreme_sales() {
        // 19 ordinary rows and one far outlier.
        let mut rows: Vec<SalesRecord> = (0..19)
            .map(|i| record(1 + (i % 12) as u32, 100.0 + i as f64, 4.0, "Delivered"))
            .collect();
        rows.push(record(6, 100_000.0, 4.0, "Delivered"));
        let ds = SalesDataset::from_records(rows);
        let indices = full_view(&ds);
        let found = anomalies(&FilteredView::new(&ds, &indices));

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].dataset_index, 19);
        assert!(found[0].z_score > Z_THRESHOLD);
    }

    #[test]
    fn zero_std_yields_no_anomalies() {
        let ds = SalesDataset::from_records(vec![
            record(1, 500.0, 4.0, "Delivered"),
            record(2, 500.0, 4.0, "Delivered"),
            record(3, 500.0, 4.0, "Delivered"),
        ]);
        let indices = full_view(&ds);
        assert!(anomalies(&FilteredView::new(&ds, &indices)).is_empty());
    }

    #[test]
    fn empty_and_single_row_views_yield_no_anomalies() {
        let ds = SalesDataset::from_records(vec![record(1, 500.0, 4.0, "Delivered")]);
        let empty: Vec<usize> = Vec::new();
        assert!(anomalies(&FilteredView::new(&ds, &empty)).is_empty());
        let one = vec![0];
        assert!(anomalies(&FilteredView::new(&ds, &one)).is_empty());
    }

    #[test]
    fn scatter_groups_by_category() {
        let cat_record = |cat: &str, sales: f64, rating: f64| {
            SalesRecord::new(
                NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
                cat.into(),
                "S".into(),
                "P".into(),
                sales,
                rating,
                "Delivered".into(),
            )
        };
        let ds = SalesDataset::from_records(vec![
            cat_record("A", 100.0, 5.0),
            cat_record("B", 200.0, 3.0),
        ]);
        let indices = full_view(&ds);
        let view = FilteredView::new(&ds, &indices);

        let groups = scatter_by_category(
            &view,
            NumericColumn::ReviewRating,
            NumericColumn::Satisfied,
        );
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "A");
        assert_eq!(groups[0].1, vec![[5.0, 1.0]]);
        assert_eq!(groups[1].1, vec![[3.0, 0.0]]);
    }
}
