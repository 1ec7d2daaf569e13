//! Error types for pagetext.
//!
//! Every fallible operation in the crate returns [`PagetextError`]. The variants
//! mirror the stages of the extraction pipeline so the controller can decide how a
//! failure is reported:
//!
//! - `UnsupportedFormat` and `Validation` are caller-facing and always raised.
//! - `Content` (the bytes are not a valid document of the claimed format) becomes an
//!   extraction result with status `error`.
//! - Everything else (`Fetch`, `Rasterization`, `Ocr`, `Delegation`, `Io`, ...) becomes
//!   an extraction result with status `failed`.
//!
//! # Example
//!
//! ```rust
//! use pagetext::{PagetextError, Result};
//!
//! fn check_page_count(count: usize) -> Result<usize> {
//!     if count == 0 {
//!         return Err(PagetextError::content("document has no pages"));
//!     }
//!     Ok(count)
//! }
//!
//! assert!(check_page_count(0).is_err());
//! ```
use thiserror::Error;

/// Result type alias using `PagetextError`.
pub type Result<T> = std::result::Result<T, PagetextError>;

/// Main error type for all pagetext operations.
#[derive(Debug, Error)]
pub enum PagetextError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Fetch error: {message}")]
    Fetch {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Content error: {message}")]
    Content {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Rasterization error: {message}")]
    Rasterization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("OCR error: {message}")]
    Ocr {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Delegation error: {message}")]
    Delegation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("{0}")]
    Other(String),
}

impl From<crate::pdf::error::PdfError> for PagetextError {
    fn from(err: crate::pdf::error::PdfError) -> Self {
        use crate::pdf::error::PdfError;

        match err {
            PdfError::InvalidPdf(_) => PagetextError::Content {
                message: err.to_string(),
                source: Some(Box::new(err)),
            },
            PdfError::IOError(msg) => PagetextError::Io(std::io::Error::other(msg)),
            _ => PagetextError::Other(err.to_string()),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        pastey::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl PagetextError {
    error_constructor!(fetch, Fetch);
    error_constructor!(content, Content);
    error_constructor!(rasterization, Rasterization);
    error_constructor!(ocr, Ocr);
    error_constructor!(delegation, Delegation);
    error_constructor!(validation, Validation);

    /// Errors the pipeline must raise instead of folding into an extraction result.
    pub fn is_caller_facing(&self) -> bool {
        matches!(self, Self::UnsupportedFormat(_) | Self::Validation { .. })
    }

    /// Short machine-readable name of the variant, used in API error bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "IoError",
            Self::UnsupportedFormat(_) => "UnsupportedFormat",
            Self::Fetch { .. } => "FetchError",
            Self::Content { .. } => "ContentError",
            Self::Rasterization { .. } => "RasterizationError",
            Self::Ocr { .. } => "OCRError",
            Self::Delegation { .. } => "DelegationError",
            Self::Validation { .. } => "ValidationError",
            Self::MissingDependency(_) => "MissingDependency",
            Self::Other(_) => "Error",
        }
    }
}
