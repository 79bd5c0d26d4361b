/// Data layer: core types, loading, filtering, and aggregation.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file, check schema, remap Target → StudentDataset
///   └──────────┘
///        │            (memoized for the process lifetime by `cache`)
///        ▼
///   ┌───────────────┐
///   │ StudentDataset │  Vec<StudentRecord>, column index
///   └───────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply FilterSpec predicates → FilteredView
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  grouped counts, summaries, correlation matrix
///   └───────────┘
/// ```

pub mod aggregate;
pub mod cache;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
