pub mod failure_rates;
pub mod modification_algorithm;
pub mod result_holder;
pub mod result_lookup;
pub mod statistics_algorithm;
pub mod test_classifier;

pub use failure_rates::{aggregate, FailureRates};
pub use modification_algorithm::ModificationBasedAlgorithm;
pub use result_holder::{AnalysisEvent, RecomputeStatus, TestAnalysisResultHolder, TriggerOutcome};
pub use result_lookup::find_computed_result;
pub use statistics_algorithm::SuspiciousStatisticsAlgorithm;
pub use test_classifier::{TestClassifier, TestVerdict};
