use std::sync::Arc;

use crate::color::ColorMap;
use crate::data::filter::{filtered_indices, Dimension, FilterSelection};
use crate::data::model::SalesDataset;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
///
/// The dataset is loaded once per opened file and then shared immutably via
/// `Arc`; every filter change just recomputes `visible_indices`.
#[derive(Default)]
pub struct AppState {
    /// Loaded dataset (None until the user opens a file).
    pub dataset: Option<Arc<SalesDataset>>,

    /// Per-dimension filter selections.
    pub filters: FilterSelection,

    /// Indices of records passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Stable category → colour assignment used by all charts.
    pub category_colors: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Ingest a newly loaded dataset and reset filters to "all selected".
    pub fn set_dataset(&mut self, dataset: SalesDataset) {
        self.filters = FilterSelection::all(&dataset);
        self.visible_indices = (0..dataset.len()).collect();
        self.category_colors = Some(ColorMap::new(&dataset.categories));
        self.dataset = Some(Arc::new(dataset));
        self.status_message = None;
    }

    /// Recompute `visible_indices` after a filter change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible_indices = filtered_indices(ds, &self.filters);
        }
    }

    /// Toggle a single value in a dimension's selection.
    pub fn toggle_filter_value(&mut self, dim: Dimension, value: &str) {
        let selected = self.filters.selected_mut(dim);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Select every observed value in a dimension.
    pub fn select_all(&mut self, dim: Dimension) {
        if let Some(ds) = &self.dataset {
            *self.filters.selected_mut(dim) = ds.distinct(dim).clone();
            self.refilter();
        }
    }

    /// Deselect every value in a dimension (hides all records).
    pub fn select_none(&mut self, dim: Dimension) {
        self.filters.selected_mut(dim).clear();
        self.refilter();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{SalesDataset, SalesRecord};
    use chrono::NaiveDate;

    fn dataset() -> SalesDataset {
        let record = |cat: &str, pay: &str| {
            SalesRecord::new(
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                cat.into(),
                "S".into(),
                pay.into(),
                10.0,
                4.0,
                "Delivered".into(),
            )
        };
        SalesDataset::from_records(vec![record("A", "Card"), record("B", "Cash")])
    }

    #[test]
    fn set_dataset_selects_everything() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        assert_eq!(state.visible_indices, vec![0, 1]);
        assert_eq!(state.filters.categories.len(), 2);
        assert!(state.category_colors.is_some());
    }

    #[test]
    fn toggling_narrows_and_restores() {
        let mut state = AppState::default();
        state.set_dataset(dataset());

        state.toggle_filter_value(Dimension::Category, "B");
        assert_eq!(state.visible_indices, vec![0]);

        state.toggle_filter_value(Dimension::Category, "B");
        assert_eq!(state.visible_indices, vec![0, 1]);
    }

    #[test]
    fn select_none_then_all_round_trips() {
        let mut state = AppState::default();
        state.set_dataset(dataset());

        state.select_none(Dimension::PaymentMethod);
        assert!(state.visible_indices.is_empty());

        state.select_all(Dimension::PaymentMethod);
        assert_eq!(state.visible_indices, vec![0, 1]);
    }
}
