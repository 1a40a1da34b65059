/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse + enrich rows → SalesDataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ SalesDataset  │  Vec<SalesRecord>, distinct-value indexes
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  three membership tests → FilteredView
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
