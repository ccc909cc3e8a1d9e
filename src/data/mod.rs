/// Data layer: tabular cell types and file loading.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  header names + Vec<Record>, column index lookup
///   └──────────┘
/// ```

pub mod loader;
pub mod model;

pub use loader::{load_table, read_delimited};
pub use model::{CellValue, MissingColumn, Record, Table};
