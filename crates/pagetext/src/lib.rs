//! pagetext - single-page text extraction with OCR fallback
//!
//! Extracts the text of one page of a remotely hosted document. The embedded text layer
//! is used when it holds something substantive; otherwise the page is rasterized and run
//! through OCR, either locally or on a remote worker.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pagetext::{ExtractionRequest, PipelineConfig, extract_page_sync};
//!
//! # fn main() -> pagetext::Result<()> {
//! let request = ExtractionRequest::new("https://example.com/contract.pdf", 0);
//! let result = extract_page_sync(&request, &PipelineConfig::default())?;
//! println!("{}", result.message);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core** (`core`): format resolution, fetching, temporary artifacts, configuration
//!   and the pipeline controller
//! - **PDF** (`pdf`): text layer extraction, Ghostscript rasterization, pdftotext recovery
//! - **OCR** (`ocr`): the Tesseract adapter
//! - **Delegation** (`delegation`): the remote OCR worker client
//! - **API** (`api`, feature `api`): HTTP worker serving `/extract` and `/ocr`

#![deny(unsafe_code)]

pub mod core;
pub mod delegation;
pub mod error;
pub mod ocr;
pub mod pdf;
pub mod process;
pub mod text;
pub mod types;

#[cfg(feature = "api")]
pub mod api;

pub use error::{PagetextError, Result};
pub use types::*;

pub use core::config::{OcrPolicy, PipelineConfig};
pub use core::format::{DocumentFormat, ExtractionStrategy, resolve_format};
pub use core::pipeline::{
    ExtractionMethod, PagePipeline, PagePipelineBuilder, PipelineReport, PipelineState, extract_page,
    extract_page_sync,
};
pub use delegation::{HttpDelegationClient, OcrDelegate};
