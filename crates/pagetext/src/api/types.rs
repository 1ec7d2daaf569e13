//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::PagePipeline;

/// Maximum accepted request body. Requests carry a URI and a page number, never the
/// document itself.
pub const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status
    pub status: String,
    /// API version
    pub version: String,
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type name
    pub error_type: String,
    /// Error message
    pub message: String,
    /// HTTP status code
    pub status_code: u16,
}

/// API server state.
///
/// The pipeline is built once at startup from the server's configuration.
#[derive(Debug, Clone)]
pub struct ApiState {
    pub pipeline: PagePipeline,
}
