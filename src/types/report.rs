//! Prediction report returned to the upload page

use crate::types::table::Table;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the classifier output column.
pub const PREDICTED_ONLINE_ORDER: &str = "Predicted_Online_Order";

/// Name of the regressor output column.
pub const PREDICTED_COST: &str = "Predicted_Cost";

/// File name offered for download.
pub const DOWNLOAD_FILE_NAME: &str = "predictions.csv";

/// One line of the results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub name: String,
    #[serde(rename = "Predicted_Online_Order")]
    pub predicted_online_order: i64,
    #[serde(rename = "Predicted_Cost")]
    pub predicted_cost: f64,
}

/// Everything the page needs to render one processed upload.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    /// Upload identifier, also attached to log lines
    pub upload_id: Uuid,

    /// When predictions were produced
    pub generated_at: DateTime<Utc>,

    /// Number of rows predicted
    pub rows: usize,

    /// First rows of the upload as received
    pub preview: Table,

    /// Name plus both predictions, per row
    pub results: Vec<ResultRow>,

    /// Full augmented table as CSV text
    pub csv: String,

    /// Suggested download file name
    pub file_name: String,
}

impl PredictionReport {
    /// Create a report for an upload.
    pub fn new(
        upload_id: Uuid,
        preview: Table,
        results: Vec<ResultRow>,
        csv: String,
    ) -> Self {
        Self {
            upload_id,
            generated_at: Utc::now(),
            rows: results.len(),
            preview,
            results,
            csv,
            file_name: DOWNLOAD_FILE_NAME.to_string(),
        }
    }
}
