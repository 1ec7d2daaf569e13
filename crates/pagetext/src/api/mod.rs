//! HTTP worker for single-page extraction.
//!
//! # Endpoints
//!
//! - `POST /extract` - Full pipeline: text layer first, local OCR when it is unusable
//! - `POST /ocr` - OCR only; the server side of the remote delegation contract
//! - `GET /health` - Health check endpoint
//!
//! Both POST endpoints take `{"page": 0, "document_uri": "..."}` (plus optional
//! `options`) and answer `{"status", "page", "message"}`. Requests for unsupported
//! formats or with an empty URI are answered with HTTP 400.
//!
//! # cURL Examples
//!
//! ```bash
//! curl -X POST http://localhost:8000/ocr \
//!      -H 'content-type: application/json' \
//!      -d '{"page": 0, "document_uri": "https://example.com/scan.pdf"}'
//!
//! curl http://localhost:8000/health
//! ```

mod error;
mod handlers;
mod server;
mod types;

pub use error::ApiError;
pub use server::{create_router, create_router_from_config, serve, worker_config};
pub use types::{ApiState, ErrorResponse, HealthResponse, MAX_REQUEST_BODY_BYTES};
