/// Data layer: snapshot loading, feature derivation, filtering, summaries.
///
/// Architecture:
/// ```text
///  all_accidents_data.parquet (.csv / .json)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ pipeline  │  motorcycles only, derived fields, bad rows dropped → AccidentTable
///   └──────────┘        (both memoized by `cache`, keyed by file fingerprint)
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  sidebar selection → row indices
///   └──────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌───────────┐  ┌─────────┐
///   │ aggregate  │  │ sample   │  summaries + chart specs / map points
///   └───────────┘  └─────────┘
/// ```

pub mod aggregate;
pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod sample;
