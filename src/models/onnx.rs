//! ONNX Runtime adapters for the classifier and the regressor

use crate::error::{PipelineError, PipelineResult};
use crate::models::capability::{Classifier, Regressor};
use crate::types::FeatureMatrix;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// ONNX session with the tensor names it is driven through.
pub struct OnnxModel {
    /// Model name used in logs and errors
    name: String,
    /// Running a session needs `&mut`, so it sits behind a mutex
    session: Mutex<Session>,
    /// Graph input receiving the `[rows, features]` float tensor
    input_name: String,
    /// Graph output holding one prediction per row
    output_name: String,
}

impl OnnxModel {
    /// Load a graph from file.
    pub fn load<P: AsRef<Path>>(
        path: P,
        name: &str,
        input_name: &str,
        output_name: &str,
        threads: usize,
    ) -> PipelineResult<Self> {
        let path = path.as_ref();
        let artifact_error = |reason: String| PipelineError::ArtifactLoad {
            artifact: name.to_string(),
            path: path.to_path_buf(),
            reason,
        };

        if !path.exists() {
            return Err(artifact_error("file not found".to_string()));
        }

        info!(model = %name, path = %path.display(), threads = threads, "Loading ONNX model");

        let session = Session::builder()
            .map_err(|e| artifact_error(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| artifact_error(e.to_string()))?
            .with_intra_threads(threads)
            .map_err(|e| artifact_error(e.to_string()))?
            .commit_from_file(path)
            .map_err(|e| artifact_error(e.to_string()))?;

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(Self {
            name: name.to_string(),
            session: Mutex::new(session),
            input_name: input_name.to_string(),
            output_name: output_name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn input_tensor(&self, features: &FeatureMatrix) -> PipelineResult<Tensor<f32>> {
        if features.n_rows() == 0 {
            return Err(PipelineError::prediction(&self.name, "no rows to predict"));
        }
        let shape = vec![features.n_rows() as i64, features.n_cols() as i64];
        Tensor::from_array((shape, features.to_f32_row_major()))
            .map_err(|e| PipelineError::prediction(&self.name, format!("input tensor: {e}")))
    }

    fn check_len(&self, got: usize, expected: usize) -> PipelineResult<()> {
        if got != expected {
            return Err(PipelineError::prediction(
                &self.name,
                format!("{} predictions for {} rows", got, expected),
            ));
        }
        Ok(())
    }

    /// Run the graph and read the output as integer labels.
    fn run_labels(&self, features: &FeatureMatrix) -> PipelineResult<Vec<i64>> {
        let input = self.input_tensor(features)?;
        let mut session = self
            .session
            .lock()
            .map_err(|e| PipelineError::prediction(&self.name, format!("session lock poisoned: {e}")))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| PipelineError::prediction(&self.name, e.to_string()))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            PipelineError::prediction(&self.name, format!("output '{}' not found", self.output_name))
        })?;

        // skl2onnx emits int64 labels; some exporters cast them to float
        let labels: Vec<i64> = if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
            data.to_vec()
        } else {
            let (_, data) = output
                .try_extract_tensor::<f32>()
                .map_err(|e| PipelineError::prediction(&self.name, format!("label output: {e}")))?;
            data.iter().map(|&v| v.round() as i64).collect()
        };

        self.check_len(labels.len(), features.n_rows())?;
        debug!(model = %self.name, rows = labels.len(), "Classifier run complete");
        Ok(labels)
    }

    /// Run the graph and read the output as one float per row.
    fn run_values(&self, features: &FeatureMatrix) -> PipelineResult<Vec<f64>> {
        let input = self.input_tensor(features)?;
        let mut session = self
            .session
            .lock()
            .map_err(|e| PipelineError::prediction(&self.name, format!("session lock poisoned: {e}")))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| PipelineError::prediction(&self.name, e.to_string()))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            PipelineError::prediction(&self.name, format!("output '{}' not found", self.output_name))
        })?;

        // [rows] or [rows, 1]
        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| PipelineError::prediction(&self.name, format!("value output: {e}")))?;
        let values: Vec<f64> = data.iter().map(|&v| v as f64).collect();

        self.check_len(values.len(), features.n_rows())?;
        debug!(model = %self.name, rows = values.len(), "Regressor run complete");
        Ok(values)
    }
}

/// Logistic-regression classifier exported to ONNX.
pub struct OnnxClassifier(OnnxModel);

impl OnnxClassifier {
    pub fn new(model: OnnxModel) -> Self {
        Self(model)
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn predict(&self, features: &FeatureMatrix) -> PipelineResult<Vec<i64>> {
        self.0.run_labels(features)
    }
}

/// Random-forest regressor exported to ONNX.
pub struct OnnxRegressor(OnnxModel);

impl OnnxRegressor {
    pub fn new(model: OnnxModel) -> Self {
        Self(model)
    }
}

impl Regressor for OnnxRegressor {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn predict(&self, features: &FeatureMatrix) -> PipelineResult<Vec<f64>> {
        self.0.run_values(features)
    }
}
