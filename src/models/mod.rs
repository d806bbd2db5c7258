//! Model artifacts and prediction components

pub mod capability;
pub mod encoder;
pub mod inference;
pub mod loader;
pub mod onnx;
pub mod scaler;

pub use capability::{CategoricalEncoder, Classifier, Regressor, Scaler};
pub use encoder::{Encoders, LabelEncoder};
pub use inference::{PredictedTable, PredictionEngine};
pub use loader::{ArtifactLoader, Artifacts};
pub use scaler::StandardScaler;
