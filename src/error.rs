//! Error taxonomy for the prediction pipeline

use std::path::PathBuf;

/// Errors raised while loading artifacts or processing an upload.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Required input columns are absent from the uploaded table.
    #[error("missing required columns: {columns:?}")]
    MissingColumns { columns: Vec<String> },

    /// The upload has a header row but no data rows.
    #[error("uploaded table has no rows to predict")]
    EmptyTable,

    /// A categorical value the encoder was never fitted on.
    #[error("unknown category {value:?} in column '{column}' (row {row})")]
    UnknownCategory {
        column: String,
        value: String,
        row: usize,
    },

    /// A feature that could not be read as a finite number reached a model.
    #[error("feature '{feature}' is not a finite number (row {row})")]
    NumericParse { feature: String, row: usize },

    /// Feature matrix does not match the fitted scaler.
    #[error("scaling failed: {reason}")]
    Scaling { reason: String },

    /// The classifier or regressor call failed.
    #[error("{model} prediction failed: {reason}")]
    Prediction { model: String, reason: String },

    /// An artifact could not be read at startup.
    #[error("failed to load {artifact} from {}: {reason}", path.display())]
    ArtifactLoad {
        artifact: String,
        path: PathBuf,
        reason: String,
    },

    /// The uploaded file is not a readable CSV.
    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl PipelineError {
    /// Short machine-readable kind, used for metrics and API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::MissingColumns { .. } => "missing_columns",
            PipelineError::EmptyTable => "empty_table",
            PipelineError::UnknownCategory { .. } => "unknown_category",
            PipelineError::NumericParse { .. } => "numeric_parse",
            PipelineError::Scaling { .. } => "scaling",
            PipelineError::Prediction { .. } => "prediction",
            PipelineError::ArtifactLoad { .. } => "artifact_load",
            PipelineError::Csv(_) => "csv",
        }
    }

    /// Whether the error was caused by the uploaded data rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::MissingColumns { .. }
                | PipelineError::EmptyTable
                | PipelineError::UnknownCategory { .. }
                | PipelineError::NumericParse { .. }
                | PipelineError::Csv(_)
        )
    }

    pub(crate) fn prediction(model: &str, reason: impl Into<String>) -> Self {
        PipelineError::Prediction {
            model: model.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias used across the pipeline.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_names_columns() {
        let err = PipelineError::MissingColumns {
            columns: vec!["rate".to_string(), "votes".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "missing required columns: [\"rate\", \"votes\"]"
        );
        assert_eq!(err.kind(), "missing_columns");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_empty_table_is_client_error() {
        let err = PipelineError::EmptyTable;
        assert_eq!(err.kind(), "empty_table");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_artifact_error_mentions_path() {
        let err = PipelineError::ArtifactLoad {
            artifact: "scaler".to_string(),
            path: PathBuf::from("models/scaler.json"),
            reason: "not found".to_string(),
        };
        assert!(err.to_string().contains("models/scaler.json"));
        assert!(!err.is_client_error());
    }
}
