//! Port trait definitions (Hexagonal Architecture)
//!
//! - BuildHistoryStore: read access to recorded test executions and the
//!   project hierarchy
//!
//! Adapters in `crate::adapters` implement these so the analysis services stay
//! independent of the storage engine.

pub mod build_history;

pub use build_history::{AnalysisWindow, BuildHistoryStore};
