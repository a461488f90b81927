//! Domain layer
//!
//! Execution records, failure rates, reasons and analysis results, plus the
//! ports the services read build history through.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
