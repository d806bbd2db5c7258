//! Artifact loader

use crate::config::ArtifactsConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::models::capability::{Classifier, Regressor, Scaler};
use crate::models::encoder::Encoders;
use crate::models::onnx::{OnnxClassifier, OnnxModel, OnnxRegressor};
use crate::models::scaler::StandardScaler;
use crate::types::features::REGRESSION_FEATURES;
use std::path::{Path, PathBuf};
use tracing::info;

/// Columns that must have a fitted encoder.
pub const ENCODED_COLUMNS: [&str; 2] = ["book_table", "listed_in(type)"];

/// The four fitted artifacts, loaded once and shared read-only.
pub struct Artifacts {
    pub classifier: Box<dyn Classifier>,
    pub regressor: Box<dyn Regressor>,
    pub encoders: Encoders,
    pub scaler: Box<dyn Scaler>,
}

impl Artifacts {
    pub fn new(
        classifier: Box<dyn Classifier>,
        regressor: Box<dyn Regressor>,
        encoders: Encoders,
        scaler: Box<dyn Scaler>,
    ) -> Self {
        Self {
            classifier,
            regressor,
            encoders,
            scaler,
        }
    }
}

impl std::fmt::Debug for Artifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artifacts")
            .field("classifier", &self.classifier.name())
            .field("regressor", &self.regressor.name())
            .field("encoders", &self.encoders)
            .field("scaler_features", &self.scaler.n_features())
            .finish()
    }
}

/// Loads artifacts from a base directory.
pub struct ArtifactLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ArtifactLoader {
    /// Create a new loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new loader with the given ONNX thread count
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    /// Load the classifier graph
    pub fn load_classifier<P: AsRef<Path>>(&self, path: P, input: &str, output: &str) -> PipelineResult<OnnxClassifier> {
        OnnxModel::load(path, "classifier", input, output, self.onnx_threads).map(OnnxClassifier::new)
    }

    /// Load the regressor graph
    pub fn load_regressor<P: AsRef<Path>>(&self, path: P, input: &str, output: &str) -> PipelineResult<OnnxRegressor> {
        OnnxModel::load(path, "regressor", input, output, self.onnx_threads).map(OnnxRegressor::new)
    }

    /// Load the encoder collection and check it covers every encoded column
    pub fn load_encoders<P: AsRef<Path>>(&self, path: P) -> PipelineResult<Encoders> {
        let path = path.as_ref();
        let encoders = Encoders::load(path)?;

        let missing: Vec<&str> = ENCODED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !encoders.contains(c))
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::ArtifactLoad {
                artifact: "label encoders".to_string(),
                path: path.to_path_buf(),
                reason: format!("no encoder for columns {:?}", missing),
            });
        }

        info!(columns = ?encoders.columns(), "Label encoders loaded");
        Ok(encoders)
    }

    /// Load the scaler and check it was fitted on the regression features
    pub fn load_scaler<P: AsRef<Path>>(&self, path: P) -> PipelineResult<StandardScaler> {
        let path = path.as_ref();
        let scaler = StandardScaler::load(path)?;

        let artifact_error = |reason: String| PipelineError::ArtifactLoad {
            artifact: "scaler".to_string(),
            path: path.to_path_buf(),
            reason,
        };

        if scaler.mean.len() != REGRESSION_FEATURES.len() {
            return Err(artifact_error(format!(
                "fitted on {} features, expected {}",
                scaler.mean.len(),
                REGRESSION_FEATURES.len()
            )));
        }
        if let Some(names) = &scaler.feature_names {
            if names.iter().map(String::as_str).ne(REGRESSION_FEATURES.iter().copied()) {
                return Err(artifact_error(format!(
                    "fitted on {:?}, expected {:?}",
                    names, REGRESSION_FEATURES
                )));
            }
        }

        info!(features = scaler.mean.len(), "Scaler loaded");
        Ok(scaler)
    }

    /// Load all four artifacts; any failure is fatal for startup
    pub fn load_all(&self, config: &ArtifactsConfig) -> PipelineResult<Artifacts> {
        let dir = PathBuf::from(&config.dir);

        let classifier = self.load_classifier(
            dir.join(&config.classifier_file),
            &config.input_name,
            &config.classifier_output,
        )?;
        let regressor = self.load_regressor(
            dir.join(&config.regressor_file),
            &config.input_name,
            &config.regressor_output,
        )?;
        let encoders = self.load_encoders(dir.join(&config.encoders_file))?;
        let scaler = self.load_scaler(dir.join(&config.scaler_file))?;

        info!(dir = %dir.display(), "Loaded all artifacts");

        Ok(Artifacts::new(
            Box::new(classifier),
            Box::new(regressor),
            encoders,
            Box::new(scaler),
        ))
    }
}

impl Default for ArtifactLoader {
    fn default() -> Self {
        Self::new()
    }
}
