pub mod batch;
pub mod classifier;
pub mod composite;
pub mod factors;
pub mod insights;

pub use batch::{BatchReport, BatchScorer, SharedReport};
pub use composite::CompositeCalculator;
