//! Label encoders fitted during training, loaded from JSON

use crate::error::{PipelineError, PipelineResult};
use crate::models::capability::CategoricalEncoder;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Encoder mapping each known label to its index in the fitted class list.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    classes: Vec<String>,
    codes: HashMap<String, i64>,
}

impl LabelEncoder {
    /// Build an encoder from the fitted classes, in code order.
    pub fn new(classes: Vec<String>) -> Result<Self, String> {
        let mut codes = HashMap::with_capacity(classes.len());
        for (code, class) in classes.iter().enumerate() {
            if codes.insert(class.clone(), code as i64).is_some() {
                return Err(format!("duplicate class {:?}", class));
            }
        }
        Ok(Self { classes, codes })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

impl CategoricalEncoder for LabelEncoder {
    fn encode(&self, value: &str) -> Option<i64> {
        self.codes.get(value).copied()
    }

    fn vocabulary_size(&self) -> usize {
        self.classes.len()
    }
}

/// Either a bare class list or an object carrying `classes_`.
#[derive(Deserialize)]
#[serde(untagged)]
enum EncoderFile {
    Classes(Vec<String>),
    Fitted {
        #[serde(alias = "classes_")]
        classes: Vec<String>,
    },
}

impl EncoderFile {
    fn into_classes(self) -> Vec<String> {
        match self {
            EncoderFile::Classes(classes) => classes,
            EncoderFile::Fitted { classes } => classes,
        }
    }
}

/// Encoders keyed by the column they were fitted on.
#[derive(Clone, Default)]
pub struct Encoders {
    by_column: HashMap<String, Arc<dyn CategoricalEncoder>>,
}

impl Encoders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an encoder for a column, replacing any previous one.
    pub fn insert(&mut self, column: &str, encoder: Arc<dyn CategoricalEncoder>) {
        self.by_column.insert(column.to_string(), encoder);
    }

    pub fn get(&self, column: &str) -> Option<&dyn CategoricalEncoder> {
        self.by_column.get(column).map(|e| e.as_ref())
    }

    pub fn contains(&self, column: &str) -> bool {
        self.by_column.contains_key(column)
    }

    /// Sorted column names that have an encoder.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = self.by_column.keys().map(String::as_str).collect();
        columns.sort_unstable();
        columns
    }

    /// Parse the `{ column: classes }` JSON document.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let files: HashMap<String, EncoderFile> =
            serde_json::from_str(json).map_err(|e| e.to_string())?;

        let mut encoders = Self::new();
        for (column, file) in files {
            let encoder = LabelEncoder::new(file.into_classes())
                .map_err(|e| format!("column '{}': {}", column, e))?;
            encoders.insert(&column, Arc::new(encoder));
        }
        Ok(encoders)
    }

    /// Load encoders from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref();
        let artifact_error = |reason: String| PipelineError::ArtifactLoad {
            artifact: "label encoders".to_string(),
            path: path.to_path_buf(),
            reason,
        };

        let json = std::fs::read_to_string(path).map_err(|e| artifact_error(e.to_string()))?;
        Self::from_json(&json).map_err(artifact_error)
    }
}

impl std::fmt::Debug for Encoders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoders")
            .field("columns", &self.columns())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_encoder_codes_follow_class_order() {
        let encoder = LabelEncoder::new(vec!["No".to_string(), "Yes".to_string()]).unwrap();
        assert_eq!(encoder.encode("No"), Some(0));
        assert_eq!(encoder.encode("Yes"), Some(1));
        assert_eq!(encoder.encode("yes"), None);
        assert_eq!(encoder.vocabulary_size(), 2);
    }

    #[test]
    fn test_duplicate_classes_rejected() {
        let err = LabelEncoder::new(vec!["A".to_string(), "A".to_string()]).unwrap_err();
        assert!(err.contains("duplicate"));
    }

    #[test]
    fn test_from_json_accepts_both_layouts() {
        let json = r#"{
            "book_table": ["No", "Yes"],
            "listed_in(type)": {"classes_": ["Buffet", "Cafes", "Delivery", "Desserts", "Dine-out", "Drinks & nightlife", "Pubs and bars"]}
        }"#;
        let encoders = Encoders::from_json(json).unwrap();
        assert_eq!(encoders.columns(), vec!["book_table", "listed_in(type)"]);
        assert_eq!(encoders.get("listed_in(type)").unwrap().encode("Delivery"), Some(2));
    }

    #[test]
    fn test_load_missing_file_names_artifact() {
        let err = Encoders::load("/nonexistent/label_encoders.json").unwrap_err();
        match err {
            PipelineError::ArtifactLoad { artifact, path, .. } => {
                assert_eq!(artifact, "label encoders");
                assert!(path.ends_with("label_encoders.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
