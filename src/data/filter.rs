use std::collections::BTreeSet;

use super::model::{SalesDataset, SalesRecord};

// ---------------------------------------------------------------------------
// Filter dimensions
// ---------------------------------------------------------------------------

/// The three categorical dimensions a user can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Category,
    State,
    PaymentMethod,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Category, Dimension::State, Dimension::PaymentMethod];

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Category => "Product Category",
            Dimension::State => "State",
            Dimension::PaymentMethod => "Payment Method",
        }
    }
}

impl SalesDataset {
    /// Sorted distinct values observed for a dimension.
    pub fn distinct(&self, dim: Dimension) -> &BTreeSet<String> {
        match dim {
            Dimension::Category => &self.categories,
            Dimension::State => &self.states,
            Dimension::PaymentMethod => &self.payment_methods,
        }
    }
}

fn dimension_value(record: &SalesRecord, dim: Dimension) -> &str {
    match dim {
        Dimension::Category => &record.product_category,
        Dimension::State => &record.state,
        Dimension::PaymentMethod => &record.payment_method,
    }
}

// ---------------------------------------------------------------------------
// FilterSelection – which values are selected per dimension
// ---------------------------------------------------------------------------

/// Per-dimension selection state. A record passes when its value in every
/// dimension is a member of the corresponding set, so an empty set hides
/// everything.
#[derive(Debug, Clone, Default)]
pub struct FilterSelection {
    pub categories: BTreeSet<String>,
    pub states: BTreeSet<String>,
    pub payment_methods: BTreeSet<String>,
}

impl FilterSelection {
    /// The default selection: every value observed in the dataset.
    pub fn all(dataset: &SalesDataset) -> Self {
        FilterSelection {
            categories: dataset.categories.clone(),
            states: dataset.states.clone(),
            payment_methods: dataset.payment_methods.clone(),
        }
    }

    pub fn selected(&self, dim: Dimension) -> &BTreeSet<String> {
        match dim {
            Dimension::Category => &self.categories,
            Dimension::State => &self.states,
            Dimension::PaymentMethod => &self.payment_methods,
        }
    }

    pub fn selected_mut(&mut self, dim: Dimension) -> &mut BTreeSet<String> {
        match dim {
            Dimension::Category => &mut self.categories,
            Dimension::State => &mut self.states,
            Dimension::PaymentMethod => &mut self.payment_methods,
        }
    }

    fn matches(&self, record: &SalesRecord) -> bool {
        Dimension::ALL
            .iter()
            .all(|&dim| self.selected(dim).contains(dimension_value(record, dim)))
    }
}

/// Return indices of records that pass all three membership tests, in
/// dataset order.
pub fn filtered_indices(dataset: &SalesDataset, selection: &FilterSelection) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| selection.matches(r))
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// FilteredView – the dataset restricted to the current selection
// ---------------------------------------------------------------------------

/// A borrowed view over the records passing the current filters. Every
/// aggregation in [`crate::analysis`] is a pure function of one of these.
#[derive(Debug, Clone, Copy)]
pub struct FilteredView<'a> {
    dataset: &'a SalesDataset,
    indices: &'a [usize],
}

impl<'a> FilteredView<'a> {
    pub fn new(dataset: &'a SalesDataset, indices: &'a [usize]) -> Self {
        FilteredView { dataset, indices }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Records in dataset order.
    pub fn records(&self) -> impl Iterator<Item = &'a SalesRecord> + '_ {
        self.indices.iter().map(|&i| &self.dataset.records[i])
    }

    /// Records together with their index into the full dataset.
    pub fn indexed_records(&self) -> impl Iterator<Item = (usize, &'a SalesRecord)> + '_ {
        self.indices.iter().map(|&i| (i, &self.dataset.records[i]))
    }
}
