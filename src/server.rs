//! HTTP surface: upload page, prediction endpoints, health and metrics

use crate::error::PipelineError;
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::models::PredictionEngine;
use crate::page::INDEX_HTML;
use crate::types::report::DOWNLOAD_FILE_NAME;
use crate::types::{PredictionReport, Table};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PredictionEngine>,
    pub metrics: Arc<PipelineMetrics>,
    /// Limits how many uploads are processed at once
    pub uploads: Arc<Semaphore>,
    pub preview_rows: usize,
}

impl AppState {
    pub fn new(
        engine: Arc<PredictionEngine>,
        metrics: Arc<PipelineMetrics>,
        max_concurrent_uploads: usize,
        preview_rows: usize,
    ) -> Self {
        Self {
            engine,
            metrics,
            uploads: Arc::new(Semaphore::new(max_concurrent_uploads.max(1))),
            preview_rows,
        }
    }
}

/// Errors returned by the HTTP handlers
#[derive(Debug)]
pub enum ApiError {
    /// The request itself is malformed (no file, broken multipart)
    BadRequest(String),
    /// The pipeline rejected or failed on the upload. The preview is kept
    /// when the file parsed, so the page can still show what was uploaded.
    Pipeline {
        error: PipelineError,
        preview: Option<Table>,
    },
    /// Worker or runtime failure
    Internal(String),
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        ApiError::Pipeline {
            error: e,
            preview: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": msg, "kind": "bad_request" }),
            ),
            ApiError::Pipeline { error: e, preview } => {
                let status = match &e {
                    PipelineError::Csv(_) => StatusCode::BAD_REQUEST,
                    e if e.is_client_error() => StatusCode::UNPROCESSABLE_ENTITY,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let mut body = serde_json::json!({ "error": e.to_string(), "kind": e.kind() });
                if let PipelineError::MissingColumns { columns } = &e {
                    body["missing_columns"] = serde_json::json!(columns);
                }
                if let Some(preview) = preview {
                    body["preview"] = serde_json::json!(preview);
                }
                (status, body)
            }
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": msg, "kind": "internal" }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the application router
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api/predict", post(predict_report))
        .route("/api/predict/csv", post(predict_csv))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let artifacts = state.engine.artifacts();
    Json(serde_json::json!({
        "status": "ready",
        "classifier": artifacts.classifier.name(),
        "regressor": artifacts.regressor.name(),
        "encoders": artifacts.encoders.columns(),
        "scaler_features": artifacts.scaler.n_features(),
    }))
}

async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

async fn predict_report(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<PredictionReport>, ApiError> {
    run_upload(&state, multipart).await.map(Json)
}

async fn predict_csv(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let report = run_upload(&state, multipart).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", DOWNLOAD_FILE_NAME),
            ),
        ],
        report.csv,
    )
        .into_response())
}

/// Pull the uploaded CSV out of the form: the `file` field, or the first file field.
async fn read_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let is_file = field.name() == Some("file") || field.file_name().is_some();
        if !is_file {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.csv").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        return Ok((file_name, data.to_vec()));
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}

/// Run one upload through the pipeline, one permit at a time.
async fn run_upload(state: &AppState, multipart: Multipart) -> Result<PredictionReport, ApiError> {
    let (file_name, bytes) = read_upload(multipart).await?;
    let upload_id = Uuid::new_v4();

    info!(upload_id = %upload_id, file = %file_name, bytes = bytes.len(), "Received upload");

    let _permit = state
        .uploads
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let start_time = Instant::now();
    let engine = state.engine.clone();
    let preview_rows = state.preview_rows;

    let result = tokio::task::spawn_blocking(move || -> Result<_, (PipelineError, Option<Table>)> {
        let table = Table::from_csv_bytes(&bytes).map_err(|e| (e, None))?;
        let preview = table.head(preview_rows);
        let processed = engine.process(table).and_then(|predicted| {
            let csv = String::from_utf8_lossy(&predicted.table.to_csv_bytes()?).into_owned();
            Ok((predicted, csv))
        });
        match processed {
            Ok((predicted, csv)) => {
                let report =
                    PredictionReport::new(upload_id, preview, predicted.result_rows(), csv);
                Ok((report, predicted.online_order, predicted.cost))
            }
            Err(e) => Err((e, Some(preview))),
        }
    })
    .await
    .map_err(|e| {
        error!(upload_id = %upload_id, error = %e, "Prediction worker failed");
        state.metrics.record_failure("internal");
        ApiError::Internal(e.to_string())
    })?;

    match result {
        Ok((report, labels, costs)) => {
            let processing_time = start_time.elapsed();
            state.metrics.record_upload(processing_time, &labels, &costs);
            info!(
                upload_id = %upload_id,
                rows = report.rows,
                processing_time_us = processing_time.as_micros(),
                "Upload processed"
            );
            Ok(report)
        }
        Err((e, preview)) => {
            state.metrics.record_failure(e.kind());
            if e.is_client_error() {
                warn!(upload_id = %upload_id, kind = e.kind(), error = %e, "Upload rejected");
            } else {
                error!(upload_id = %upload_id, kind = e.kind(), error = %e, "Upload failed");
            }
            Err(ApiError::Pipeline { error: e, preview })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inference::tests::stub_artifacts;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    const BOUNDARY: &str = "----predictor-test-boundary";

    fn app() -> (Router, Arc<PipelineMetrics>) {
        let metrics = Arc::new(PipelineMetrics::new());
        let state = AppState::new(
            Arc::new(PredictionEngine::with_artifacts(stub_artifacts())),
            metrics.clone(),
            1,
            2,
        );
        (build_router(state, 1024 * 1024), metrics)
    }

    fn upload(uri: &str, csv: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"restaurants.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {csv}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const CSV: &str = "name,book_table,votes,rate,listed_in(type),online_order\n\
                       A,Yes,775,4.1/5,Buffet,Yes\n\
                       B,No,12,3.8/5,Cafes,No\n\
                       C,No,300,3.2/5,Dining,Yes";

    #[tokio::test]
    async fn test_index_page() {
        let (app, _) = app();
        let resp = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("Restaurant Analysis"));
    }

    #[tokio::test]
    async fn test_health_reports_artifacts() {
        let (app, _) = app();
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["status"], "ready");
        assert_eq!(body["scaler_features"], 4);
    }

    #[tokio::test]
    async fn test_predict_report() {
        let (app, metrics) = app();
        let resp = app.oneshot(upload("/api/predict", CSV)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = json_body(resp).await;
        assert_eq!(body["rows"], 3);
        assert_eq!(body["preview"]["rows"].as_array().unwrap().len(), 2);
        assert_eq!(body["results"][0]["name"], "A");
        assert_eq!(body["results"][1]["Predicted_Online_Order"], 0);
        assert_eq!(body["file_name"], "predictions.csv");
        assert!(body["csv"]
            .as_str()
            .unwrap()
            .starts_with("name,book_table,votes,rate,listed_in(type),online_order,Predicted_Online_Order,Predicted_Cost\n"));
        assert_eq!(metrics.snapshot().uploads_processed, 1);
    }

    #[tokio::test]
    async fn test_predict_csv_download() {
        let (app, _) = app();
        let resp = app.oneshot(upload("/api/predict/csv", CSV)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"predictions.csv\""
        );

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let table = Table::from_csv_bytes(&bytes).unwrap();
        assert_eq!(table.column("name").unwrap(), vec!["A", "B", "C"]);
        assert_eq!(
            table.column("Predicted_Online_Order").unwrap(),
            vec!["1", "0", "1"]
        );
    }

    #[tokio::test]
    async fn test_missing_columns_are_reported() {
        let (app, metrics) = app();
        let resp = app
            .oneshot(upload("/api/predict", "name,votes\nA,1"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = json_body(resp).await;
        assert_eq!(
            body["missing_columns"],
            serde_json::json!(["book_table", "rate", "listed_in(type)", "online_order"])
        );
        assert_eq!(
            body["preview"]["headers"],
            serde_json::json!(["name", "votes"])
        );
        assert_eq!(body["preview"]["rows"], serde_json::json!([["A", "1"]]));
        assert_eq!(metrics.snapshot().failures_by_kind.get("missing_columns"), Some(&1));
    }

    #[tokio::test]
    async fn test_header_only_upload_is_unprocessable() {
        let (app, _) = app();
        let csv = "name,book_table,votes,rate,listed_in(type),online_order";
        let resp = app.oneshot(upload("/api/predict", csv)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(resp).await["kind"], "empty_table");
    }

    #[tokio::test]
    async fn test_malformed_csv_has_no_preview() {
        let (app, _) = app();
        let resp = app
            .oneshot(upload("/api/predict", "name,votes\nA,1,extra"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json_body(resp).await;
        assert_eq!(body["kind"], "csv");
        assert!(body.get("preview").is_none());
    }

    #[tokio::test]
    async fn test_unknown_category_is_unprocessable() {
        let (app, _) = app();
        let csv = "name,book_table,votes,rate,listed_in(type),online_order\nA,Maybe,1,4.1/5,Cafes,Yes";
        let resp = app.oneshot(upload("/api/predict", csv)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(resp).await["kind"], "unknown_category");
    }

    #[tokio::test]
    async fn test_request_without_file() {
        let (app, _) = app();
        let body = format!("--{BOUNDARY}--\r\n");
        let req = Request::post("/api/predict")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
