//! Configuration management for the prediction service

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Largest accepted upload body in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8501,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Fitted model artifacts
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Directory containing the artifact files
    pub dir: String,
    /// Logistic-regression classifier (ONNX)
    #[serde(default = "default_classifier_file")]
    pub classifier_file: String,
    /// Random-forest regressor (ONNX)
    #[serde(default = "default_regressor_file")]
    pub regressor_file: String,
    /// Label encoders per column (JSON)
    #[serde(default = "default_encoders_file")]
    pub encoders_file: String,
    /// Standard scaler parameters (JSON)
    #[serde(default = "default_scaler_file")]
    pub scaler_file: String,
    /// Graph input name shared by both ONNX models
    #[serde(default = "default_input_name")]
    pub input_name: String,
    /// Classifier output holding the predicted label
    #[serde(default = "default_classifier_output")]
    pub classifier_output: String,
    /// Regressor output holding the predicted value
    #[serde(default = "default_regressor_output")]
    pub regressor_output: String,
    /// Number of threads for ONNX inference per model (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_classifier_file() -> String {
    "logistic_regression_model.onnx".to_string()
}

fn default_regressor_file() -> String {
    "random_forest_regressor.onnx".to_string()
}

fn default_encoders_file() -> String {
    "label_encoders.json".to_string()
}

fn default_scaler_file() -> String {
    "scaler.json".to_string()
}

// skl2onnx naming
fn default_input_name() -> String {
    "float_input".to_string()
}

fn default_classifier_output() -> String {
    "label".to_string()
}

fn default_regressor_output() -> String {
    "variable".to_string()
}

fn default_onnx_threads() -> usize {
    1
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: "models".to_string(),
            classifier_file: default_classifier_file(),
            regressor_file: default_regressor_file(),
            encoders_file: default_encoders_file(),
            scaler_file: default_scaler_file(),
            input_name: default_input_name(),
            classifier_output: default_classifier_output(),
            regressor_output: default_regressor_output(),
            onnx_threads: default_onnx_threads(),
        }
    }
}

/// Upload processing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Uploads processed at the same time
    pub max_concurrent_uploads: usize,
    /// Rows shown in the upload preview
    pub preview_rows: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_uploads: 1,
            preview_rows: 5,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Metrics reporting configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Seconds between summary log lines; 0 disables the reporter
    pub report_interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: 300,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific path.
    ///
    /// The file is optional; `PREDICTOR__SECTION__KEY` environment variables
    /// override file values.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::with_prefix("PREDICTOR").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            artifacts: ArtifactsConfig::default(),
            pipeline: PipelineConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.artifacts.classifier_file, "logistic_regression_model.onnx");
        assert_eq!(config.artifacts.input_name, "float_input");
        assert_eq!(config.pipeline.max_concurrent_uploads, 1);
        assert_eq!(config.pipeline.preview_rows, 5);
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[server]\nhost = \"127.0.0.1\"\nport = 9000\n\n[artifacts]\ndir = \"/srv/models\"\n",
        )
        .unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.artifacts.dir, "/srv/models");
        assert_eq!(config.artifacts.scaler_file, "scaler.json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_single_key_section_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server]\nport = 9000\n").unwrap();

        let config = AppConfig::load_from_path(&path).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.max_upload_bytes, 50 * 1024 * 1024);
    }

    #[test]
    fn test_single_env_override_without_file() {
        std::env::set_var("PREDICTOR__PIPELINE__MAX_CONCURRENT_UPLOADS", "2");
        let result = AppConfig::load_from_path("/nonexistent/config.toml");
        std::env::remove_var("PREDICTOR__PIPELINE__MAX_CONCURRENT_UPLOADS");

        let config = result.unwrap();
        assert_eq!(config.pipeline.max_concurrent_uploads, 2);
        assert_eq!(config.pipeline.preview_rows, 5);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_from_path("/nonexistent/config.toml").unwrap();
        assert_eq!(config.artifacts.dir, "models");
    }
}
