//! Narrow interfaces over the fitted artifacts
//!
//! The pipeline only ever talks to these traits; the ONNX and JSON adapters
//! behind them are loader concerns.

use crate::error::PipelineResult;
use crate::types::FeatureMatrix;

/// Predicts a discrete label per row.
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    /// One label per input row, in row order.
    fn predict(&self, features: &FeatureMatrix) -> PipelineResult<Vec<i64>>;
}

/// Predicts a continuous value per row.
pub trait Regressor: Send + Sync {
    fn name(&self) -> &str;

    /// One scalar per input row, in row order.
    fn predict(&self, features: &FeatureMatrix) -> PipelineResult<Vec<f64>>;
}

/// Maps a fitted vocabulary of labels to integer codes.
pub trait CategoricalEncoder: Send + Sync {
    /// Code for `value`, or `None` if the label was never seen during fitting.
    fn encode(&self, value: &str) -> Option<i64>;

    /// Number of known labels.
    fn vocabulary_size(&self) -> usize;
}

/// Numeric transform fitted on a fixed, ordered feature set.
pub trait Scaler: Send + Sync {
    /// Transform every row; fails if the columns differ from the fitted set.
    fn transform(&self, matrix: &FeatureMatrix) -> PipelineResult<FeatureMatrix>;

    /// Number of features the scaler was fitted on.
    fn n_features(&self) -> usize;
}
