//! Core extraction orchestration.
//!
//! - **Format resolution** ([`format`]): URI extension to extraction strategy
//! - **Fetching** ([`fetch`]): document bytes from HTTP(S) or the local filesystem
//! - **Artifacts** ([`artifacts`]): temporary files that clean up after themselves
//! - **Pipeline** ([`pipeline`]): the per-page state machine and its entry points
//! - **Configuration** ([`config`]): loading, environment overrides and validation
//!
//! # Example
//!
//! ```rust,no_run
//! use pagetext::core::config::PipelineConfig;
//! use pagetext::core::pipeline::PagePipeline;
//! use pagetext::ExtractionRequest;
//!
//! # async fn example() -> pagetext::Result<()> {
//! let pipeline = PagePipeline::new(PipelineConfig::load(None)?)?;
//! let report = pipeline
//!     .run_with_report(&ExtractionRequest::new("https://example.com/scan.pdf", 2))
//!     .await?;
//! println!("{:?} via {:?}", report.result.status, report.method);
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod config;
pub mod fetch;
pub mod format;
pub mod pipeline;

pub use config::{OcrPolicy, PipelineConfig};
pub use format::{DocumentFormat, ExtractionStrategy, ResolvedFormat, resolve_format};
pub use pipeline::{ExtractionMethod, PagePipeline, PipelineReport, PipelineState};
