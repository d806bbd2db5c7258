//! Feature preparation for the restaurant models.
//!
//! Validates the uploaded table, cleans the `rate` and `online_order`
//! columns, applies the fitted label encoders, and assembles the
//! classification and (scaled) regression matrices in the exact column
//! order the models were trained on.

use crate::error::{PipelineError, PipelineResult};
use crate::models::capability::Scaler;
use crate::models::encoder::Encoders;
use crate::types::features::{CLASSIFICATION_FEATURES, REGRESSION_FEATURES};
use crate::types::{FeatureMatrix, PreparedFeatures, Table};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Columns an upload must contain for predictions to be computable.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "book_table",
    "votes",
    "rate",
    "listed_in(type)",
    "online_order",
];

static RATE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\.\d+").expect("valid rate pattern"));

/// Required columns absent from `table`, in required-column order.
pub fn missing_columns(table: &Table) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|c| !table.has_column(c))
        .map(|c| c.to_string())
        .collect()
}

/// First decimal number in a rating such as `"4.1/5"`; NaN when there is none.
pub fn extract_rate(text: &str) -> f64 {
    RATE_PATTERN
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(f64::NAN)
}

/// Re-extract a rate from its own textual form.
///
/// Idempotent on values produced by [`extract_rate`]; NaN stays NaN.
pub fn renormalize_rate(value: f64) -> f64 {
    // Debug keeps the fractional part ("4.0"), Display would print "4"
    extract_rate(&format!("{:?}", value))
}

/// Normalize the `online_order` column.
///
/// A column whose non-empty cells are all numeric is passed through (empty
/// cells become NaN). Otherwise the column is text: `"Yes"` maps to 1 and
/// every other value, including `"No"` and empty cells, maps to 0.
pub fn normalize_online_order(values: &[&str]) -> Vec<f64> {
    let numeric = values
        .iter()
        .all(|v| v.trim().is_empty() || v.trim().parse::<f64>().is_ok());

    if numeric {
        values.iter().map(|v| parse_number(v)).collect()
    } else {
        values
            .iter()
            .map(|v| match *v {
                "Yes" => 1.0,
                "No" => 0.0,
                // unrecognized text counts as no online ordering
                _ => 0.0,
            })
            .collect()
    }
}

/// Parse a numeric cell; empty or malformed cells become NaN.
fn parse_number(text: &str) -> f64 {
    text.trim().parse().unwrap_or(f64::NAN)
}

/// Encode one categorical column with its fitted encoder.
fn encode_column(table: &Table, column: &str, encoders: &Encoders) -> PipelineResult<Vec<f64>> {
    let encoder = encoders
        .get(column)
        .ok_or_else(|| PipelineError::prediction("label encoders", format!("no encoder fitted for column '{}'", column)))?;

    // every required column was checked by the caller
    let values = table.column(column).unwrap_or_default();
    values
        .iter()
        .enumerate()
        .map(|(row, value)| {
            encoder
                .encode(value)
                .map(|code| code as f64)
                .ok_or_else(|| PipelineError::UnknownCategory {
                    column: column.to_string(),
                    value: value.to_string(),
                    row,
                })
        })
        .collect()
}

/// Build the classification and regression matrices for an upload.
///
/// Fails with [`PipelineError::MissingColumns`] before touching any data when
/// a required column is absent.
pub fn prepare(
    table: &Table,
    encoders: &Encoders,
    scaler: &dyn Scaler,
) -> PipelineResult<PreparedFeatures> {
    let missing = missing_columns(table);
    if !missing.is_empty() {
        return Err(PipelineError::MissingColumns { columns: missing });
    }

    let column = |name: &str| table.column(name).unwrap_or_default();

    let rate: Vec<f64> = column("rate").iter().map(|v| extract_rate(v)).collect();
    let online_order = normalize_online_order(&column("online_order"));
    let votes: Vec<f64> = column("votes").iter().map(|v| parse_number(v)).collect();
    let book_table = encode_column(table, "book_table", encoders)?;
    let listed_in = encode_column(table, "listed_in(type)", encoders)?;

    let classification = FeatureMatrix::with_columns(
        &CLASSIFICATION_FEATURES,
        (0..table.len())
            .map(|i| vec![book_table[i], votes[i], rate[i], listed_in[i]])
            .collect(),
    );

    let regression_raw = FeatureMatrix::with_columns(
        &REGRESSION_FEATURES,
        (0..table.len())
            .map(|i| vec![votes[i], renormalize_rate(rate[i]), online_order[i], listed_in[i]])
            .collect(),
    );

    let regression = scaler.transform(&regression_raw)?;

    debug!(
        rows = table.len(),
        unparsed_rates = rate.iter().filter(|r| r.is_nan()).count(),
        "Features prepared"
    );

    Ok(PreparedFeatures {
        classification,
        regression_raw,
        regression,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::encoder::LabelEncoder;
    use crate::models::scaler::StandardScaler;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn encoders() -> Encoders {
        let mut encoders = Encoders::new();
        encoders.insert(
            "book_table",
            Arc::new(LabelEncoder::new(vec!["No".into(), "Yes".into()]).unwrap()),
        );
        encoders.insert(
            "listed_in(type)",
            Arc::new(
                LabelEncoder::new(vec!["Buffet".into(), "Cafes".into(), "Delivery".into(), "Dining".into()])
                    .unwrap(),
            ),
        );
        encoders
    }

    fn identity_scaler() -> StandardScaler {
        StandardScaler::new(None, vec![0.0; 4], vec![1.0; 4])
    }

    fn table(rows: &[[&str; 6]]) -> Table {
        Table::new(
            ["name", "book_table", "votes", "rate", "listed_in(type)", "online_order"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_missing_columns_reported_exactly() {
        let t = Table::new(
            vec!["name".to_string(), "votes".to_string(), "online_order".to_string()],
            vec![vec!["A".to_string(), "1".to_string(), "Yes".to_string()]],
        );
        let err = prepare(&t, &encoders(), &identity_scaler()).unwrap_err();
        match err {
            PipelineError::MissingColumns { columns } => {
                assert_eq!(columns, vec!["book_table", "rate", "listed_in(type)"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_name_is_not_required() {
        let t = Table::new(
            REQUIRED_COLUMNS.iter().map(|s| s.to_string()).collect(),
            vec![["Yes", "10", "4.0/5", "Cafes", "No"].iter().map(|s| s.to_string()).collect()],
        );
        assert!(prepare(&t, &encoders(), &identity_scaler()).is_ok());
    }

    #[test]
    fn test_extract_rate() {
        assert_eq!(extract_rate("4.1/5"), 4.1);
        assert_eq!(extract_rate(" 3.85 /5"), 3.85);
        assert!(extract_rate("NEW").is_nan());
        assert!(extract_rate("4/5").is_nan());
        assert!(extract_rate("").is_nan());
    }

    #[test]
    fn test_renormalize_rate_keeps_whole_numbers() {
        assert_eq!(renormalize_rate(4.0), 4.0);
        assert_eq!(renormalize_rate(4.1), 4.1);
        assert!(renormalize_rate(f64::NAN).is_nan());
    }

    #[test]
    fn test_online_order_text_mapping() {
        assert_eq!(
            normalize_online_order(&["Yes", "No", "Maybe", ""]),
            vec![1.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_online_order_integer_pass_through() {
        assert_eq!(normalize_online_order(&["1", "0", "1"]), vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_online_order_mixed_column_is_text() {
        // a single text cell makes the whole column text, so "1" maps to 0
        assert_eq!(normalize_online_order(&["1", "Yes"]), vec![0.0, 1.0]);
    }

    #[test]
    fn test_single_row_scenario() {
        let t = table(&[["X", "Yes", "100", "4.1/5", "Dining", "Yes"]]);
        let prepared = prepare(&t, &encoders(), &identity_scaler()).unwrap();

        assert_eq!(prepared.classification.columns(), &CLASSIFICATION_FEATURES);
        assert_eq!(prepared.classification.rows()[0], vec![1.0, 100.0, 4.1, 3.0]);
        assert_eq!(prepared.regression_raw.columns(), &REGRESSION_FEATURES);
        assert_eq!(prepared.regression_raw.rows()[0], vec![100.0, 4.1, 1.0, 3.0]);
        assert_eq!(prepared.regression.rows()[0], vec![100.0, 4.1, 1.0, 3.0]);
    }

    #[test]
    fn test_regression_matrix_is_scaled() {
        let t = table(&[["X", "No", "300", "4.5/5", "Cafes", "No"]]);
        let scaler = StandardScaler::new(None, vec![100.0, 4.0, 0.0, 1.0], vec![100.0, 0.5, 1.0, 1.0]);
        let prepared = prepare(&t, &encoders(), &scaler).unwrap();
        assert_eq!(prepared.regression.rows()[0], vec![2.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_unknown_category_names_value_and_row() {
        let t = table(&[
            ["A", "Yes", "1", "4.1/5", "Cafes", "Yes"],
            ["B", "Yes", "1", "4.1/5", "Food Court", "Yes"],
        ]);
        let err = prepare(&t, &encoders(), &identity_scaler()).unwrap_err();
        match err {
            PipelineError::UnknownCategory { column, value, row } => {
                assert_eq!(column, "listed_in(type)");
                assert_eq!(value, "Food Court");
                assert_eq!(row, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unparseable_rate_is_not_rejected() {
        let t = table(&[["A", "No", "5", "NEW", "Buffet", "No"]]);
        let prepared = prepare(&t, &encoders(), &identity_scaler()).unwrap();
        assert!(prepared.classification.rows()[0][2].is_nan());
        assert!(prepared.regression.rows()[0][1].is_nan());
    }

    #[test]
    fn test_scaler_arity_mismatch() {
        let t = table(&[["A", "No", "5", "3.9/5", "Buffet", "No"]]);
        let scaler = StandardScaler::new(None, vec![0.0; 3], vec![1.0; 3]);
        let err = prepare(&t, &encoders(), &scaler).unwrap_err();
        assert_eq!(err.kind(), "scaling");
    }

    #[test]
    fn test_prepare_twice_is_identical() {
        let t = table(&[
            ["A", "Yes", "775", "4.1/5", "Buffet", "Yes"],
            ["B", "No", "0", "-", "Delivery", "No"],
            ["C", "No", "88", "3.0 /5", "Cafes", "Yes"],
        ]);
        let first = prepare(&t, &encoders(), &identity_scaler()).unwrap();
        let second = prepare(&t, &encoders(), &identity_scaler()).unwrap();
        assert!(first.classification.same_bits(&second.classification));
        assert!(first.regression.same_bits(&second.regression));
    }

    proptest! {
        #[test]
        fn prop_rate_extraction_reads_decimal(whole in 0u32..10, frac in 0u32..100) {
            let text = format!("{}.{:02}/5", whole, frac);
            let expected: f64 = format!("{}.{:02}", whole, frac).parse().unwrap();
            prop_assert_eq!(extract_rate(&text), expected);
            prop_assert_eq!(renormalize_rate(expected), expected);
        }

        #[test]
        fn prop_rows_keep_input_order(votes in proptest::collection::vec(0u32..100_000, 1..40)) {
            let rows: Vec<[String; 6]> = votes
                .iter()
                .map(|v| [
                    "R".to_string(),
                    "No".to_string(),
                    v.to_string(),
                    "3.5/5".to_string(),
                    "Cafes".to_string(),
                    "Yes".to_string(),
                ])
                .collect();
            let t = Table::new(
                ["name", "book_table", "votes", "rate", "listed_in(type)", "online_order"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                rows.into_iter().map(|r| r.to_vec()).collect(),
            );
            let prepared = prepare(&t, &encoders(), &identity_scaler()).unwrap();
            let expected: Vec<f64> = votes.iter().map(|&v| v as f64).collect();
            prop_assert_eq!(prepared.classification.column("votes").unwrap(), expected);
        }
    }
}
