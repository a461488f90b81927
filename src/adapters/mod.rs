//! Build-history store adapters.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryBuildHistory;
pub use sqlite::SqliteBuildHistory;
