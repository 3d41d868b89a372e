// Catalog module: the store the engine reads its snapshots from.

pub mod seed;
pub mod sqlite;

pub use sqlite::{RecordFilters, SqliteCatalog};
