//! API request handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use crate::{ExtractionRequest, ExtractionResult, PagetextError};

use super::{
    error::ApiError,
    types::{ApiState, HealthResponse},
};

fn parse_request(payload: Result<Json<ExtractionRequest>, JsonRejection>) -> Result<ExtractionRequest, ApiError> {
    payload.map(|Json(request)| request).map_err(|e| {
        ApiError::validation(PagetextError::validation(format!(
            "Invalid request body: {}",
            e.body_text()
        )))
    })
}

/// Extract endpoint handler.
///
/// POST /extract
///
/// Runs the full pipeline (direct text first, then local OCR) with the server's
/// configuration.
pub async fn extract_handler(
    State(state): State<ApiState>,
    payload: Result<Json<ExtractionRequest>, JsonRejection>,
) -> Result<Json<ExtractionResult>, ApiError> {
    let request = parse_request(payload)?;
    let result = state.pipeline.run(&request).await?;
    Ok(Json(result))
}

/// OCR endpoint handler.
///
/// POST /ocr
///
/// Server side of the delegation contract: accepts `{page, document_uri}` and always
/// runs local OCR without looking at the text layer.
pub async fn ocr_handler(
    State(state): State<ApiState>,
    payload: Result<Json<ExtractionRequest>, JsonRejection>,
) -> Result<Json<ExtractionResult>, ApiError> {
    let request = parse_request(payload)?;
    let report = state.pipeline.run_ocr_only(&request).await?;
    Ok(Json(report.result))
}

/// Health check endpoint handler.
///
/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
