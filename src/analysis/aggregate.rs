use std::collections::BTreeMap;

use crate::analysis::stats::RatingSummary;
use crate::data::filter::FilteredView;
use crate::data::model::{Month, SalesRecord};

// ---------------------------------------------------------------------------
// Group-by helpers
// ---------------------------------------------------------------------------

fn group_sum<K, F>(view: &FilteredView<'_>, key: F) -> BTreeMap<K, f64>
where
    K: Ord,
    F: Fn(&SalesRecord) -> K,
{
    let mut sums: BTreeMap<K, f64> = BTreeMap::new();
    for r in view.records() {
        *sums.entry(key(r)).or_default() += r.total_sales_inr;
    }
    sums
}

// ---------------------------------------------------------------------------
// Revenue breakdowns
// ---------------------------------------------------------------------------

/// Total sales per product category, sorted by category name. Categories
/// with no rows in the view are absent, not zero.
pub fn category_revenue(view: &FilteredView<'_>) -> Vec<(String, f64)> {
    group_sum(view, |r| r.product_category.clone())
        .into_iter()
        .collect()
}

/// Total sales per payment method, sorted by method name.
pub fn payment_revenue(view: &FilteredView<'_>) -> Vec<(String, f64)> {
    group_sum(view, |r| r.payment_method.clone())
        .into_iter()
        .collect()
}

/// Mean review rating per payment method.
pub fn payment_avg_rating(view: &FilteredView<'_>) -> Vec<(String, f64)> {
    let mut acc: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for r in view.records() {
        let entry = acc.entry(r.payment_method.clone()).or_default();
        entry.0 += r.review_rating;
        entry.1 += 1;
    }
    acc.into_iter()
        .map(|(method, (sum, n))| (method, sum / n as f64))
        .collect()
}

// ---------------------------------------------------------------------------
// Time trends
// ---------------------------------------------------------------------------

/// Total sales per month, always in canonical Jan→Dec order. Months with no
/// rows in the view are absent.
pub fn monthly_revenue(view: &FilteredView<'_>) -> Vec<(Month, f64)> {
    // Month's Ord is calendar order, so the BTreeMap walk is Jan→Dec.
    group_sum(view, |r| r.month).into_iter().collect()
}

/// Total sales per calendar quarter, ordered 1→4.
pub fn quarterly_revenue(view: &FilteredView<'_>) -> Vec<(u8, f64)> {
    group_sum(view, |r| r.quarter).into_iter().collect()
}

// ---------------------------------------------------------------------------
// Delivery × rating distribution
// ---------------------------------------------------------------------------

/// Five-number rating summary per delivery status (for box-style charts).
pub fn rating_by_delivery(view: &FilteredView<'_>) -> Vec<(String, RatingSummary)> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for r in view.records() {
        groups
            .entry(r.delivery_status.clone())
            .or_default()
            .push(r.review_rating);
    }
    groups
        .into_iter()
        .filter_map(|(status, ratings)| RatingSummary::from_values(ratings).map(|s| (status, s)))
        .collect()
}

// ---------------------------------------------------------------------------
// State × category pivot
// ---------------------------------------------------------------------------

/// Sales summed per (state, category) cell. Unlike the one-dimensional
/// breakdowns, combinations with no rows are explicitly zero-filled so the
/// heatmap is rectangular.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    /// Row labels, sorted.
    pub states: Vec<String>,
    /// Column labels, sorted.
    pub categories: Vec<String>,
    /// `values[state_idx][category_idx]`, zero where no sales exist.
    pub values: Vec<Vec<f64>>,
}

impl PivotTable {
    pub fn is_empty(&self) -> bool {
        self.states.is_empty() || self.categories.is_empty()
    }

    /// Largest cell value (0 for an empty table).
    pub fn max_value(&self) -> f64 {
        self.values
            .iter()
            .flatten()
            .copied()
            .fold(0.0_f64, f64::max)
    }
}

pub fn state_category_pivot(view: &FilteredView<'_>) -> PivotTable {
    let sums = group_sum(view, |r| (r.state.clone(), r.product_category.clone()));

    let mut states: Vec<String> = sums.keys().map(|(s, _)| s.clone()).collect();
    states.dedup();
    let mut categories: Vec<String> = sums.keys().map(|(_, c)| c.clone()).collect();
    categories.sort();
    categories.dedup();

    let values = states
        .iter()
        .map(|s| {
            categories
                .iter()
                .map(|c| {
                    sums.get(&(s.clone(), c.clone()))
                        .copied()
                        .unwrap_or(0.0)
                })
                .collect()
        })
        .collect();

    PivotTable {
        states,
        categories,
        values,
    }
}

// ---------------------------------------------------------------------------
// Headline KPIs
// ---------------------------------------------------------------------------

/// The three headline metrics shown above the charts. Means are NaN for an
/// empty view; the UI renders those as a dash.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kpis {
    pub total_revenue: f64,
    pub avg_rating: f64,
    /// Fraction of records with `delivered_flag == 1`, in `[0, 1]`.
    pub delivery_rate: f64,
}

pub fn kpis(view: &FilteredView<'_>) -> Kpis {
    let n = view.len() as f64;
    let mut total_revenue = 0.0;
    let mut rating_sum = 0.0;
    let mut delivered = 0.0;
    for r in view.records() {
        total_revenue += r.total_sales_inr;
        rating_sum += r.review_rating;
        delivered += f64::from(r.delivered_flag);
    }
    Kpis {
        total_revenue,
        avg_rating: rating_sum / n,
        delivery_rate: delivered / n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{filtered_indices, FilterSelection};
    use crate::data::model::{SalesDataset, SalesRecord};
    use chrono::NaiveDate;

    fn record(
        date: (i32, u32, u32),
        cat: &str,
        state: &str,
        pay: &str,
        sales: f64,
        rating: f64,
        status: &str,
    ) -> SalesRecord {
        SalesRecord::new(
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            cat.into(),
            state.into(),
            pay.into(),
            sales,
            rating,
            status.into(),
        )
    }

    fn view_of<'a>(ds: &'a SalesDataset, indices: &'a [usize]) -> FilteredView<'a> {
        FilteredView::new(ds, indices)
    }

    #[test]
    fn category_revenue_conserves_totals() {
        let ds = SalesDataset::from_records(vec![
            record((2025, 1, 1), "A", "S1", "Card", 100.0, 4.0, "Delivered"),
            record((2025, 2, 1), "A", "S1", "Cash", 300.0, 3.0, "Delivered"),
            record((2025, 3, 1), "B", "S2", "Card", 200.0, 5.0, "Returned"),
        ]);
        let indices = filtered_indices(&ds, &FilterSelection::all(&ds));
        let view = view_of(&ds, &indices);

        let by_category = category_revenue(&view);
        let aggregated: f64 = by_category.iter().map(|(_, v)| v).sum();
        let raw: f64 = view.records().map(|r| r.total_sales_inr).sum();
        assert_eq!(aggregated, raw);
    }

    #[test]
    fn worked_example_from_three_rows() {
        let ds = SalesDataset::from_records(vec![
            record((2025, 1, 1), "A", "S1", "Card", 100.0, 4.0, "Delivered"),
            record((2025, 1, 2), "A", "S1", "Cash", 300.0, 4.0, "Delivered"),
            record((2025, 1, 3), "B", "S2", "Card", 200.0, 4.0, "Delivered"),
        ]);
        let mut sel = FilterSelection::all(&ds);
        sel.categories = ["A".to_string()].into();
        let indices = filtered_indices(&ds, &sel);
        assert_eq!(indices.len(), 2);

        let view = view_of(&ds, &indices);
        assert_eq!(category_revenue(&view), vec![("A".to_string(), 400.0)]);
        assert_eq!(
            payment_revenue(&view),
            vec![("Card".to_string(), 100.0), ("Cash".to_string(), 300.0)]
        );
    }

    #[test]
    fn monthly_revenue_is_calendar_ordered() {
        use crate::data::model::Month;
        // Rows deliberately out of calendar order.
        let ds = SalesDataset::from_records(vec![
            record((2025, 12, 1), "A", "S", "P", 10.0, 4.0, "Delivered"),
            record((2025, 1, 1), "A", "S", "P", 20.0, 4.0, "Delivered"),
            record((2025, 8, 1), "A", "S", "P", 30.0, 4.0, "Delivered"),
            record((2025, 1, 15), "A", "S", "P", 5.0, 4.0, "Delivered"),
        ]);
        let indices = filtered_indices(&ds, &FilterSelection::all(&ds));
        let monthly = monthly_revenue(&view_of(&ds, &indices));
        assert_eq!(
            monthly,
            vec![(Month::Jan, 25.0), (Month::Aug, 30.0), (Month::Dec, 10.0)]
        );
    }

    #[test]
    fn quarterly_revenue_is_ordered_one_to_four() {
        let ds = SalesDataset::from_records(vec![
            record((2025, 11, 1), "A", "S", "P", 40.0, 4.0, "Delivered"),
            record((2025, 2, 1), "A", "S", "P", 10.0, 4.0, "Delivered"),
            record((2025, 5, 1), "A", "S", "P", 20.0, 4.0, "Delivered"),
        ]);
        let indices = filtered_indices(&ds, &FilterSelection::all(&ds));
        let quarterly = quarterly_revenue(&view_of(&ds, &indices));
        assert_eq!(quarterly, vec![(1, 10.0), (2, 20.0), (4, 40.0)]);
    }

    #[test]
    fn pivot_zero_fills_missing_combinations() {
        let ds = SalesDataset::from_records(vec![
            record((2025, 1, 1), "X", "A", "P", 100.0, 4.0, "Delivered"),
            record((2025, 1, 2), "Y", "A", "P", 50.0, 4.0, "Delivered"),
            record((2025, 1, 3), "X", "B", "P", 70.0, 4.0, "Delivered"),
            // no sales of Y in state B
        ]);
        let indices = filtered_indices(&ds, &FilterSelection::all(&ds));
        let pivot = state_category_pivot(&view_of(&ds, &indices));

        assert_eq!(pivot.states, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(pivot.categories, vec!["X".to_string(), "Y".to_string()]);
        assert_eq!(pivot.values[0], vec![100.0, 50.0]);
        assert_eq!(pivot.values[1], vec![70.0, 0.0]);
        assert_eq!(pivot.max_value(), 100.0);
    }

    #[test]
    fn payment_avg_rating_is_a_mean() {
        let ds = SalesDataset::from_records(vec![
            record((2025, 1, 1), "A", "S", "Card", 10.0, 5.0, "Delivered"),
            record((2025, 1, 2), "A", "S", "Card", 10.0, 3.0, "Delivered"),
            record((2025, 1, 3), "A", "S", "Cash", 10.0, 2.0, "Delivered"),
        ]);
        let indices = filtered_indices(&ds, &FilterSelection::all(&ds));
        let avg = payment_avg_rating(&view_of(&ds, &indices));
        assert_eq!(
            avg,
            vec![("Card".to_string(), 4.0), ("Cash".to_string(), 2.0)]
        );
    }

    #[test]
    fn empty_view_yields_empty_tables() {
        let ds = SalesDataset::from_records(vec![record(
            (2025, 1, 1),
            "A",
            "S",
            "P",
            10.0,
            4.0,
            "Delivered",
        )]);
        let indices: Vec<usize> = Vec::new();
        let view = view_of(&ds, &indices);

        assert!(category_revenue(&view).is_empty());
        assert!(payment_revenue(&view).is_empty());
        assert!(monthly_revenue(&view).is_empty());
        assert!(quarterly_revenue(&view).is_empty());
        assert!(rating_by_delivery(&view).is_empty());
        assert!(state_category_pivot(&view).is_empty());

        let k = kpis(&view);
        assert_eq!(k.total_revenue, 0.0);
        assert!(k.avg_rating.is_nan());
        assert!(k.delivery_rate.is_nan());
    }

    #[test]
    fn kpis_match_hand_computation() {
        let ds = SalesDataset::from_records(vec![
            record((2025, 1, 1), "A", "S", "P", 100.0, 4.0, "Delivered"),
            record((2025, 1, 2), "A", "S", "P", 200.0, 2.0, "Returned"),
        ]);
        let indices = filtered_indices(&ds, &FilterSelection::all(&ds));
        let k = kpis(&view_of(&ds, &indices));
        assert_eq!(k.total_revenue, 300.0);
        assert_eq!(k.avg_rating, 3.0);
        assert_eq!(k.delivery_rate, 0.5);
    }
}
