//! Remote OCR delegation.
//!
//! When the calling environment can't afford the OCR toolchain (execution-time or
//! binary-size limits), the page is handed to a second worker that runs the OCR-only
//! pipeline. The wire contract is a single synchronous exchange:
//!
//! - request: `{"page": 0, "document_uri": "https://..."}`
//! - response: an [`ExtractionResult`](crate::types::ExtractionResult)
//!
//! There is no retry. A timeout does not cancel the work on the remote side.

use crate::core::config::DelegationConfig;
use crate::types::{DelegationRequest, ExtractionResult};
use crate::{PagetextError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Hands a page to a remote OCR worker and waits for its verdict.
#[async_trait]
pub trait OcrDelegate: Send + Sync {
    /// Name of the worker, for logs.
    fn worker_name(&self) -> &str;

    /// # Errors
    ///
    /// `PagetextError::Delegation` on transport failure, timeout or a malformed response.
    async fn delegate(&self, request: &DelegationRequest) -> Result<ExtractionResult>;
}

/// [`OcrDelegate`] speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDelegationClient {
    client: Client,
    endpoint: String,
    worker_name: String,
    timeout: Duration,
}

impl HttpDelegationClient {
    /// # Errors
    ///
    /// `PagetextError::Validation` if no endpoint is configured.
    pub fn new(config: &DelegationConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| PagetextError::validation("Remote OCR requires delegation.endpoint"))?;
        let timeout = Duration::from_secs(config.timeout_secs);

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PagetextError::delegation_with_source("Failed to build HTTP client", e))?;

        Ok(Self {
            client,
            endpoint,
            worker_name: config.worker_name.clone(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl OcrDelegate for HttpDelegationClient {
    fn worker_name(&self) -> &str {
        &self.worker_name
    }

    #[tracing::instrument(skip(self), fields(worker = %self.worker_name))]
    async fn delegate(&self, request: &DelegationRequest) -> Result<ExtractionResult> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    format!("timed out after {} seconds", self.timeout.as_secs())
                } else {
                    "request failed".to_string()
                };
                PagetextError::delegation_with_source(format!("Worker '{}' {}", self.worker_name, reason), e)
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            PagetextError::delegation_with_source(format!("Failed to read response from '{}'", self.worker_name), e)
        })?;

        if !status.is_success() {
            return Err(PagetextError::delegation(format!(
                "Worker '{}' answered HTTP {}: {}",
                self.worker_name,
                status,
                String::from_utf8_lossy(&body)
            )));
        }

        let result: ExtractionResult = serde_json::from_slice(&body).map_err(|e| {
            PagetextError::delegation_with_source(format!("Malformed response from worker '{}'", self.worker_name), e)
        })?;

        tracing::debug!(status = %result.status, "Worker responded");
        Ok(result)
    }
}
