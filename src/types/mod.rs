//! Type definitions for the prediction pipeline

pub mod features;
pub mod report;
pub mod table;

pub use features::{FeatureMatrix, PreparedFeatures};
pub use report::{PredictionReport, ResultRow};
pub use table::Table;
