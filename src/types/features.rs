//! Feature matrices handed to the models

/// Column names of the classification feature vector, in model order.
pub const CLASSIFICATION_FEATURES: [&str; 4] = ["book_table", "votes", "rate", "listed_in(type)"];

/// Column names of the regression feature vector, in scaler/model order.
pub const REGRESSION_FEATURES: [&str; 4] = ["votes", "rate", "online_order", "listed_in(type)"];

/// Dense row-major matrix with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Create a matrix; every row must have one value per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    /// Create a matrix from static column names.
    pub fn with_columns(columns: &[&str], rows: Vec<Vec<f64>>) -> Self {
        Self::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Values of one column in row order.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r[idx]).collect())
    }

    /// Flattened `f32` buffer in row-major order, as ONNX graphs expect.
    pub fn to_f32_row_major(&self) -> Vec<f32> {
        self.rows
            .iter()
            .flat_map(|r| r.iter().map(|&v| v as f32))
            .collect()
    }

    /// First cell that is NaN or infinite, as `(row, column name)`.
    pub fn first_non_finite(&self) -> Option<(usize, &str)> {
        self.rows.iter().enumerate().find_map(|(i, row)| {
            row.iter()
                .position(|v| !v.is_finite())
                .map(|j| (i, self.columns[j].as_str()))
        })
    }

    /// Bitwise equality, treating NaN cells in the same position as equal.
    pub fn same_bits(&self, other: &FeatureMatrix) -> bool {
        self.columns == other.columns
            && self.rows.len() == other.rows.len()
            && self.rows.iter().zip(&other.rows).all(|(a, b)| {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
            })
    }
}

/// Output of feature preparation for one upload.
#[derive(Debug, Clone)]
pub struct PreparedFeatures {
    /// `(book_table, votes, rate, listed_in(type))` per row.
    pub classification: FeatureMatrix,
    /// `(votes, rate, online_order, listed_in(type))` per row, before scaling.
    pub regression_raw: FeatureMatrix,
    /// The regression matrix after scaling.
    pub regression: FeatureMatrix,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_and_flatten() {
        let m = FeatureMatrix::with_columns(&["a", "b"], vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(m.n_rows(), 2);
        assert_eq!(m.n_cols(), 2);
        assert_eq!(m.column("b"), Some(vec![2.0, 4.0]));
        assert_eq!(m.to_f32_row_major(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_first_non_finite() {
        let m = FeatureMatrix::with_columns(&["a", "b"], vec![vec![1.0, 2.0], vec![3.0, f64::NAN]]);
        assert_eq!(m.first_non_finite(), Some((1, "b")));
        assert!(m.same_bits(&m.clone()));
        assert_ne!(m, m.clone());
    }
}
