//! Request and result types shared by every extraction path.
//!
//! [`ExtractionResult`] is the only structure that crosses the external boundary. The
//! local pipeline, the HTTP worker and the remote delegation client all produce and
//! consume exactly this shape:
//!
//! ```json
//! {"status": "success", "page": 0, "message": "extracted text"}
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message carried by results whose document bytes could not be parsed.
pub const CONTENT_ERROR_MESSAGE: &str = "Content error";

/// Per-request options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionOptions {
    /// Have the OCR engine emit a searchable PDF and recover the text from its text layer.
    ///
    /// When false the engine's plain-text sidecar is read instead.
    #[serde(default = "default_true")]
    pub produce_searchable_output: bool,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            produce_searchable_output: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A request to extract the text of one page of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    /// Location of the document. The file extension of its path selects the format.
    pub document_uri: String,

    /// Zero-based page index.
    pub page: u32,

    #[serde(default)]
    pub options: ExtractionOptions,
}

impl ExtractionRequest {
    pub fn new(document_uri: impl Into<String>, page: u32) -> Self {
        Self {
            document_uri: document_uri.into(),
            page,
            options: ExtractionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExtractionOptions) -> Self {
        self.options = options;
        self
    }

    /// The payload sent to a remote OCR worker for this request.
    pub fn delegation_request(&self) -> DelegationRequest {
        DelegationRequest {
            page: self.page,
            document_uri: self.document_uri.clone(),
        }
    }
}

/// Wire payload of the remote delegation contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationRequest {
    pub page: u32,
    pub document_uri: String,
}

impl From<DelegationRequest> for ExtractionRequest {
    fn from(request: DelegationRequest) -> Self {
        ExtractionRequest::new(request.document_uri, request.page)
    }
}

/// Outcome of an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    Success,
    /// Extraction could not be completed (fetch, rasterization, OCR or delegation failure).
    Failed,
    /// The document bytes could not be parsed as the claimed format.
    Error,
}

impl ExtractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStatus::Success => "success",
            ExtractionStatus::Failed => "failed",
            ExtractionStatus::Error => "error",
        }
    }
}

impl fmt::Display for ExtractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of extracting one page.
///
/// `message` holds the extracted text on success, an empty string on `failed` and a
/// short diagnostic on `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub status: ExtractionStatus,
    pub page: u32,
    #[serde(default)]
    pub message: String,
}

impl ExtractionResult {
    pub fn success(page: u32, text: impl Into<String>) -> Self {
        Self {
            status: ExtractionStatus::Success,
            page,
            message: text.into(),
        }
    }

    pub fn failed(page: u32) -> Self {
        Self {
            status: ExtractionStatus::Failed,
            page,
            message: String::new(),
        }
    }

    pub fn content_error(page: u32) -> Self {
        Self {
            status: ExtractionStatus::Error,
            page,
            message: CONTENT_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ExtractionStatus::Success
    }
}
