//! Restaurant Predictor Library
//!
//! Takes an uploaded restaurant CSV, prepares the feature matrices expected by
//! two pre-trained models, and returns the upload with an online-order
//! prediction and an estimated cost for two appended to every row.

pub mod config;
pub mod error;
pub mod feature_preparer;
pub mod metrics;
pub mod models;
pub mod page;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use error::{PipelineError, PipelineResult};
pub use models::{PredictedTable, PredictionEngine};
pub use server::{build_router, AppState};
pub use types::{PredictionReport, Table};
