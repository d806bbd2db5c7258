//! Standard scaler fitted on the regression features

use crate::error::{PipelineError, PipelineResult};
use crate::models::capability::Scaler;
use crate::types::FeatureMatrix;
use serde::Deserialize;
use std::path::Path;

/// Fitted standardization parameters: `(x - mean) / scale` per feature.
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    /// Feature names recorded at fit time, if the scaler was fitted on named columns
    #[serde(default, alias = "feature_names_in_")]
    pub feature_names: Option<Vec<String>>,
    #[serde(alias = "mean_")]
    pub mean: Vec<f64>,
    #[serde(alias = "scale_")]
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(feature_names: Option<Vec<String>>, mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self {
            feature_names,
            mean,
            scale,
        }
    }

    /// Load scaler parameters from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref();
        let artifact_error = |reason: String| PipelineError::ArtifactLoad {
            artifact: "scaler".to_string(),
            path: path.to_path_buf(),
            reason,
        };

        let json = std::fs::read_to_string(path).map_err(|e| artifact_error(e.to_string()))?;
        let scaler: StandardScaler =
            serde_json::from_str(&json).map_err(|e| artifact_error(e.to_string()))?;
        scaler.validate().map_err(artifact_error)?;
        Ok(scaler)
    }

    /// Check that the parameter vectors agree with each other.
    pub fn validate(&self) -> Result<(), String> {
        if self.mean.len() != self.scale.len() {
            return Err(format!(
                "mean has {} values but scale has {}",
                self.mean.len(),
                self.scale.len()
            ));
        }
        if let Some(names) = &self.feature_names {
            if names.len() != self.mean.len() {
                return Err(format!(
                    "{} feature names for {} fitted features",
                    names.len(),
                    self.mean.len()
                ));
            }
        }
        Ok(())
    }
}

impl Scaler for StandardScaler {
    fn transform(&self, matrix: &FeatureMatrix) -> PipelineResult<FeatureMatrix> {
        if matrix.n_cols() != self.mean.len() {
            return Err(PipelineError::Scaling {
                reason: format!(
                    "expected {} features, got {}",
                    self.mean.len(),
                    matrix.n_cols()
                ),
            });
        }
        if let Some(names) = &self.feature_names {
            if names.as_slice() != matrix.columns() {
                return Err(PipelineError::Scaling {
                    reason: format!(
                        "feature order {:?} does not match fitted order {:?}",
                        matrix.columns(),
                        names
                    ),
                });
            }
        }

        let rows = matrix
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .zip(self.mean.iter().zip(&self.scale))
                    .map(|(&x, (&mean, &scale))| {
                        // zero-variance features are fitted with scale 1
                        let scale = if scale == 0.0 { 1.0 } else { scale };
                        (x - mean) / scale
                    })
                    .collect()
            })
            .collect();

        Ok(FeatureMatrix::new(matrix.columns().to_vec(), rows))
    }

    fn n_features(&self) -> usize {
        self.mean.len()
    }
}
