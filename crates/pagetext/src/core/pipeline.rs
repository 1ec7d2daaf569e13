//! Single-page extraction pipeline.
//!
//! The controller walks one request through a small state machine:
//!
//! ```text
//! Init -> Resolved -> DirectTextAttempted -> Accepted ------------------------> Done
//!                  |                      `-> OcrRequired -> LocalOcr --------> Done
//!                  `-> Skipped ------------> OcrRequired -> RemoteDelegation -> Done
//! ```
//!
//! Invalid requests and unsupported formats are raised to the caller. Every other
//! failure is folded into the returned [`ExtractionResult`]: `error` when the document
//! bytes could not be parsed, `failed` for anything else.

use super::artifacts::TempArtifact;
use super::config::{OcrPolicy, PipelineConfig};
use super::fetch::{DocumentFetcher, HttpFetcher, RawDocument};
use super::format::{ExtractionStrategy, ResolvedFormat, resolve_format};
use crate::delegation::{HttpDelegationClient, OcrDelegate};
use crate::ocr::{OcrOutputMode, TesseractOcr};
use crate::pdf::{PageRasterizer, PdfError};
use crate::process::{SystemToolRunner, ToolRunner};
use crate::text::{TextUsability, UsabilityFilter};
use crate::types::{ExtractionRequest, ExtractionResult};
use crate::{PagetextError, Result};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::Arc;

static GLOBAL_RUNTIME: Lazy<std::io::Result<tokio::runtime::Runtime>> =
    Lazy::new(|| tokio::runtime::Builder::new_multi_thread().enable_all().build());

/// States visited while processing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Init,
    Resolved,
    DirectTextAttempted,
    Skipped,
    Accepted,
    OcrRequired,
    LocalOcr,
    RemoteDelegation,
    Done,
}

/// Which path produced the final text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    DirectText,
    LocalOcr,
    RemoteOcr,
    /// The request ended in `failed` or `error` before any path produced a result.
    None,
}

/// Result of a request together with how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub result: ExtractionResult,
    pub method: ExtractionMethod,
    pub trace: Vec<PipelineState>,
}

#[derive(Debug, Clone, Copy)]
struct Plan {
    direct_text: bool,
    policy: OcrPolicy,
}

/// The extraction controller.
///
/// Cheap to clone and safe to share between tasks: it holds no mutable state and every
/// collaborator sits behind an `Arc`.
#[derive(Clone)]
pub struct PagePipeline {
    config: Arc<PipelineConfig>,
    fetcher: Arc<dyn DocumentFetcher>,
    filter: Arc<UsabilityFilter>,
    rasterizer: PageRasterizer,
    ocr: TesseractOcr,
    delegate: Option<Arc<dyn OcrDelegate>>,
}

impl std::fmt::Debug for PagePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagePipeline")
            .field("config", &self.config)
            .field("delegate", &self.delegate.as_ref().map(|d| d.worker_name().to_string()))
            .finish_non_exhaustive()
    }
}

/// Assembles a [`PagePipeline`], defaulting every collaborator not supplied.
pub struct PagePipelineBuilder {
    config: PipelineConfig,
    fetcher: Option<Arc<dyn DocumentFetcher>>,
    runner: Option<Arc<dyn ToolRunner>>,
    delegate: Option<Arc<dyn OcrDelegate>>,
}

impl PagePipelineBuilder {
    pub fn fetcher(mut self, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn tool_runner(mut self, runner: Arc<dyn ToolRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    pub fn delegate(mut self, delegate: Arc<dyn OcrDelegate>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    /// # Errors
    ///
    /// `PagetextError::Validation` if the configuration is invalid.
    pub fn build(self) -> Result<PagePipeline> {
        let config = self.config;
        config.validate()?;

        let runner: Arc<dyn ToolRunner> = self.runner.unwrap_or_else(|| Arc::new(SystemToolRunner));

        let fetcher: Arc<dyn DocumentFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(HttpFetcher::new(&config.fetch)?),
        };

        let delegate: Option<Arc<dyn OcrDelegate>> = match (self.delegate, config.ocr_policy) {
            (Some(delegate), _) => Some(delegate),
            (None, OcrPolicy::Remote) => Some(Arc::new(HttpDelegationClient::new(&config.delegation)?)),
            (None, OcrPolicy::Local) => None,
        };

        let filter = UsabilityFilter::new(&config.watermark_phrases)?;
        let rasterizer = PageRasterizer::new(
            Arc::clone(&runner),
            &config.tools,
            config.rasterizer.clone(),
            config.temp_dir.clone(),
        );
        let ocr = TesseractOcr::new(Arc::clone(&runner), &config.tools, &config.ocr)?;

        Ok(PagePipeline {
            config: Arc::new(config),
            fetcher,
            filter: Arc::new(filter),
            rasterizer,
            ocr,
            delegate,
        })
    }
}

impl PagePipeline {
    /// Pipeline with the system tool runner, HTTP fetcher and (for remote policy) HTTP
    /// delegation client.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: PipelineConfig) -> PagePipelineBuilder {
        PagePipelineBuilder {
            config,
            fetcher: None,
            runner: None,
            delegate: None,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Extract the text of one page.
    ///
    /// # Errors
    ///
    /// Only `PagetextError::Validation` (empty URI) and `PagetextError::UnsupportedFormat`
    /// are returned; all other failures are reported through the result status.
    pub async fn run(&self, request: &ExtractionRequest) -> Result<ExtractionResult> {
        Ok(self.run_with_report(request).await?.result)
    }

    /// Like [`run`](Self::run), also reporting the path taken and the visited states.
    pub async fn run_with_report(&self, request: &ExtractionRequest) -> Result<PipelineReport> {
        let plan = Plan {
            direct_text: self.config.direct_text,
            policy: self.config.ocr_policy,
        };
        self.execute(request, plan).await
    }

    /// OCR-only processing: no direct-text attempt, always local OCR.
    ///
    /// This is what a delegation worker runs for an incoming request.
    pub async fn run_ocr_only(&self, request: &ExtractionRequest) -> Result<PipelineReport> {
        let plan = Plan {
            direct_text: false,
            policy: OcrPolicy::Local,
        };
        self.execute(request, plan).await
    }

    #[tracing::instrument(
        name = "extract_page",
        skip(self, request, plan),
        fields(page = request.page, document_uri = %request.document_uri)
    )]
    async fn execute(&self, request: &ExtractionRequest, plan: Plan) -> Result<PipelineReport> {
        let mut trace = vec![PipelineState::Init];

        if request.document_uri.trim().is_empty() {
            return Err(PagetextError::validation("document_uri must not be empty"));
        }

        let format = resolve_format(&request.document_uri)?;
        trace.push(PipelineState::Resolved);
        tracing::info!(format = ?format.format, "Extracting page");

        let (result, method) = match self.drive(request, &format, plan, &mut trace).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_caller_facing() => return Err(e),
            Err(e @ PagetextError::Content { .. }) => {
                tracing::warn!(error = %e, "Document content could not be parsed");
                (ExtractionResult::content_error(request.page), ExtractionMethod::None)
            }
            Err(e) => {
                tracing::warn!(error = %e, kind = e.kind(), "Page extraction failed");
                (ExtractionResult::failed(request.page), ExtractionMethod::None)
            }
        };

        trace.push(PipelineState::Done);
        tracing::info!(status = %result.status, method = ?method, "Page extraction finished");

        Ok(PipelineReport { result, method, trace })
    }

    async fn drive(
        &self,
        request: &ExtractionRequest,
        format: &ResolvedFormat,
        plan: Plan,
        trace: &mut Vec<PipelineState>,
    ) -> Result<(ExtractionResult, ExtractionMethod)> {
        let page = request.page;
        let attempt_direct = plan.direct_text && format.strategy() == ExtractionStrategy::DirectText;

        // A remote worker fetches the document itself
        let mut document = if attempt_direct || plan.policy == OcrPolicy::Local {
            Some(self.fetch(&request.document_uri, format).await?)
        } else {
            None
        };

        if let (true, Some(doc)) = (attempt_direct, &document) {
            trace.push(PipelineState::DirectTextAttempted);
            if let TextUsability::Usable(text) = self.direct_text(Arc::clone(doc), page).await? {
                trace.push(PipelineState::Accepted);
                return Ok((ExtractionResult::success(page, text), ExtractionMethod::DirectText));
            }
        } else {
            trace.push(PipelineState::Skipped);
        }

        trace.push(PipelineState::OcrRequired);

        match plan.policy {
            OcrPolicy::Local => {
                trace.push(PipelineState::LocalOcr);
                let document = match document.take() {
                    Some(document) => document,
                    None => self.fetch(&request.document_uri, format).await?,
                };
                let text = self.local_ocr(&document, request).await?;
                Ok((ExtractionResult::success(page, text), ExtractionMethod::LocalOcr))
            }
            OcrPolicy::Remote => {
                trace.push(PipelineState::RemoteDelegation);
                let result = self.delegate(request).await?;
                Ok((result, ExtractionMethod::RemoteOcr))
            }
        }
    }

    async fn fetch(&self, uri: &str, format: &ResolvedFormat) -> Result<Arc<RawDocument>> {
        let bytes = self.fetcher.fetch(uri).await?;
        Ok(Arc::new(RawDocument {
            bytes,
            format: format.clone(),
        }))
    }

    async fn direct_text(&self, document: Arc<RawDocument>, page: u32) -> Result<TextUsability> {
        let extracted = tokio::task::spawn_blocking(move || crate::pdf::extract_page_text(&document.bytes, page))
            .await
            .map_err(|e| PagetextError::Other(format!("Direct text extraction task failed: {}", e)))?;

        let text = match extracted {
            Ok(text) => text,
            Err(PdfError::TextExtractionFailed(msg)) => {
                tracing::debug!(reason = %msg, "Text layer unreadable, falling back to OCR");
                return Ok(TextUsability::Unusable);
            }
            Err(e) => return Err(e.into()),
        };

        let verdict = self.filter.evaluate(&text);
        tracing::debug!(usable = verdict.is_usable(), chars = text.len(), "Direct text evaluated");
        Ok(verdict)
    }

    async fn local_ocr(&self, document: &RawDocument, request: &ExtractionRequest) -> Result<String> {
        let source = TempArtifact::with_contents(
            self.config.temp_dir.as_deref(),
            &document.format.temp_suffix(),
            &document.bytes,
        )?;
        let mode = OcrOutputMode::from_searchable(request.options.produce_searchable_output);

        let output = match document.format.strategy() {
            ExtractionStrategy::DirectText => {
                let image = self.rasterizer.rasterize(source.path(), request.page).await?;
                self.ocr.recognize(image.path(), mode).await?
            }
            ExtractionStrategy::ImageOnly => self.ocr.recognize(source.path(), mode).await?,
        };

        Ok(output.text)
    }

    async fn delegate(&self, request: &ExtractionRequest) -> Result<ExtractionResult> {
        let delegate = self
            .delegate
            .as_ref()
            .ok_or_else(|| PagetextError::delegation("No remote OCR worker configured"))?;

        tracing::debug!(worker = delegate.worker_name(), "Delegating page to remote OCR worker");
        let mut result = delegate.delegate(&request.delegation_request()).await?;

        if result.page != request.page {
            tracing::warn!(
                expected = request.page,
                received = result.page,
                "Remote worker answered for a different page, keeping the requested page"
            );
            result.page = request.page;
        }

        Ok(result)
    }
}

/// Extract one page with a pipeline built from `config`.
///
/// # Example
///
/// ```rust,no_run
/// use pagetext::{ExtractionRequest, PipelineConfig, extract_page};
///
/// # async fn example() -> pagetext::Result<()> {
/// let request = ExtractionRequest::new("https://example.com/invoice.pdf", 0);
/// let result = extract_page(&request, &PipelineConfig::default()).await?;
/// println!("{}: {}", result.status, result.message);
/// # Ok(())
/// # }
/// ```
pub async fn extract_page(request: &ExtractionRequest, config: &PipelineConfig) -> Result<ExtractionResult> {
    let pipeline = PagePipeline::new(config.clone())?;
    pipeline.run(request).await
}

/// Synchronous wrapper for [`extract_page`] on a shared Tokio runtime.
///
/// Must not be called from within an async context.
pub fn extract_page_sync(request: &ExtractionRequest, config: &PipelineConfig) -> Result<ExtractionResult> {
    let runtime = GLOBAL_RUNTIME
        .as_ref()
        .map_err(|e| PagetextError::Other(format!("Failed to create global Tokio runtime: {}", e)))?;
    runtime.block_on(extract_page(request, config))
}
