//! Prediction orchestration: prepare features, run both models, merge results

use crate::config::AppConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::feature_preparer;
use crate::models::capability::{Classifier, Regressor};
use crate::models::loader::{ArtifactLoader, Artifacts};
use crate::types::report::{PREDICTED_COST, PREDICTED_ONLINE_ORDER};
use crate::types::{FeatureMatrix, PreparedFeatures, ResultRow, Table};
use tracing::{debug, info};

/// Original table with both prediction columns appended.
#[derive(Debug, Clone)]
pub struct PredictedTable {
    /// Upload plus `Predicted_Online_Order` and `Predicted_Cost`
    pub table: Table,
    /// Classifier label per row
    pub online_order: Vec<i64>,
    /// Regressor output per row
    pub cost: Vec<f64>,
}

impl PredictedTable {
    /// Rows for the results view; the name is empty when the upload has no `name` column.
    pub fn result_rows(&self) -> Vec<ResultRow> {
        let names = self.table.column("name");
        self.online_order
            .iter()
            .zip(&self.cost)
            .enumerate()
            .map(|(i, (&label, &cost))| ResultRow {
                name: names
                    .as_ref()
                    .map(|n| n[i].to_string())
                    .unwrap_or_default(),
                predicted_online_order: label,
                predicted_cost: cost,
            })
            .collect()
    }
}

/// Reject matrices carrying NaN or infinite cells before they reach a model.
fn ensure_finite(features: &FeatureMatrix) -> PipelineResult<()> {
    match features.first_non_finite() {
        Some((row, feature)) => Err(PipelineError::NumericParse {
            feature: feature.to_string(),
            row,
        }),
        None => Ok(()),
    }
}

/// Run both models once over the whole upload and append their outputs.
///
/// Predictions are aligned with `table` by row position; any model failure
/// aborts the batch.
pub fn predict(
    table: Table,
    features: &PreparedFeatures,
    classifier: &dyn Classifier,
    regressor: &dyn Regressor,
) -> PipelineResult<PredictedTable> {
    if table.is_empty() {
        return Err(PipelineError::EmptyTable);
    }
    ensure_finite(&features.classification)?;
    ensure_finite(&features.regression)?;

    let online_order = classifier.predict(&features.classification)?;
    let cost = regressor.predict(&features.regression)?;

    for (model, got) in [
        (classifier.name(), online_order.len()),
        (regressor.name(), cost.len()),
    ] {
        if got != table.len() {
            return Err(PipelineError::prediction(
                model,
                format!("{} predictions for {} rows", got, table.len()),
            ));
        }
    }

    let mut table = table;
    table.set_column(
        PREDICTED_ONLINE_ORDER,
        online_order.iter().map(|l| l.to_string()).collect(),
    )?;
    table.set_column(
        PREDICTED_COST,
        cost.iter().map(|c| format!("{:?}", c)).collect(),
    )?;

    debug!(rows = table.len(), "Predictions merged");

    Ok(PredictedTable {
        table,
        online_order,
        cost,
    })
}

/// Owns the loaded artifacts and runs uploads through the pipeline.
pub struct PredictionEngine {
    artifacts: Artifacts,
}

impl PredictionEngine {
    /// Load every artifact named in the configuration
    pub fn new(config: &AppConfig) -> PipelineResult<Self> {
        let loader = ArtifactLoader::with_threads(config.artifacts.onnx_threads);
        let artifacts = loader.load_all(&config.artifacts)?;

        info!(
            classifier = %artifacts.classifier.name(),
            regressor = %artifacts.regressor.name(),
            encoders = ?artifacts.encoders.columns(),
            "Prediction engine initialized"
        );

        Ok(Self::with_artifacts(artifacts))
    }

    /// Build an engine around already-loaded artifacts
    pub fn with_artifacts(artifacts: Artifacts) -> Self {
        Self { artifacts }
    }

    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    /// Validate and prepare the feature matrices for an upload
    pub fn prepare(&self, table: &Table) -> PipelineResult<PreparedFeatures> {
        feature_preparer::prepare(table, &self.artifacts.encoders, self.artifacts.scaler.as_ref())
    }

    /// Run prepared features through both models
    pub fn predict(&self, table: Table, features: &PreparedFeatures) -> PipelineResult<PredictedTable> {
        predict(
            table,
            features,
            self.artifacts.classifier.as_ref(),
            self.artifacts.regressor.as_ref(),
        )
    }

    /// Prepare and predict in one pass
    pub fn process(&self, table: Table) -> PipelineResult<PredictedTable> {
        let features = self.prepare(&table)?;
        self.predict(table, &features)
    }
}
