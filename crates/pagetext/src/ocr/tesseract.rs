//! Tesseract command-line adapter.

use super::types::{OcrOutput, OcrOutputMode, PSMMode};
use super::validation::{validate_language_code, validate_psm};
use crate::core::artifacts::{DerivedArtifact, append_extension};
use crate::core::config::{OcrConfig, ToolsConfig};
use crate::pdf::layout::LayoutTextRecovery;
use crate::process::{ToolInvocation, ToolRunner};
use crate::text::decode_utf8_lossy_ignore;
use crate::{PagetextError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Runs `tesseract` over a raster image.
///
/// The output base is the image path itself, so Tesseract writes `<image>.txt` or
/// `<image>.pdf`. Both are removed before [`TesseractOcr::recognize`] returns.
#[derive(Clone)]
pub struct TesseractOcr {
    runner: Arc<dyn ToolRunner>,
    program: PathBuf,
    env: Vec<(String, OsString)>,
    tessdata_dir: Option<PathBuf>,
    timeout: Duration,
    language: String,
    psm: PSMMode,
    recovery: LayoutTextRecovery,
}

impl TesseractOcr {
    /// # Errors
    ///
    /// `PagetextError::Validation` for an unknown language code or PSM.
    pub fn new(runner: Arc<dyn ToolRunner>, tools: &ToolsConfig, ocr: &OcrConfig) -> Result<Self> {
        validate_language_code(&ocr.language)?;
        let psm = validate_psm(ocr.psm)?;

        Ok(Self {
            recovery: LayoutTextRecovery::new(Arc::clone(&runner), tools),
            runner,
            program: tools.tesseract_program(),
            env: tools.library_env(&tools.tesseract),
            tessdata_dir: tools.resolved_tessdata_dir(),
            timeout: tools.timeout(),
            language: ocr.language.clone(),
            psm,
        })
    }

    pub fn invocation(&self, image: &Path, mode: OcrOutputMode) -> ToolInvocation {
        let mut invocation = ToolInvocation::new(&self.program, self.timeout)
            .arg(image.as_os_str())
            .arg(image.as_os_str())
            .args(["-l", self.language.as_str()])
            .args(["--psm".to_string(), self.psm.as_u8().to_string()]);

        if let Some(dir) = &self.tessdata_dir {
            invocation = invocation.arg("--tessdata-dir").arg(dir.as_os_str());
        }

        if mode == OcrOutputMode::Searchable {
            invocation = invocation.arg("pdf");
        }

        invocation.envs(self.env.clone())
    }

    /// Recognize the text of `image`.
    ///
    /// # Errors
    ///
    /// `PagetextError::Ocr` if Tesseract fails, its expected output is missing, or text
    /// recovery from the searchable PDF fails.
    #[tracing::instrument(skip(self), fields(language = %self.language, psm = self.psm.as_u8()))]
    pub async fn recognize(&self, image: &Path, mode: OcrOutputMode) -> Result<OcrOutput> {
        let sidecar = DerivedArtifact::new(append_extension(image, OcrOutputMode::TextOnly.extension()));
        let searchable = DerivedArtifact::new(append_extension(image, OcrOutputMode::Searchable.extension()));

        let output = self
            .runner
            .run(self.invocation(image, mode))
            .await
            .map_err(|e| PagetextError::ocr_with_source("Tesseract failed to run", e))?;

        if !output.success() {
            return Err(PagetextError::ocr(format!(
                "Tesseract exited with {}: {}",
                output.status,
                output.stderr_lossy()
            )));
        }

        let text = match mode {
            OcrOutputMode::TextOnly => {
                let bytes = tokio::fs::read(sidecar.path())
                    .await
                    .map_err(|e| PagetextError::ocr_with_source("Tesseract produced no text output", e))?;
                decode_utf8_lossy_ignore(&bytes).trim().to_string()
            }
            OcrOutputMode::Searchable => {
                if !searchable.exists() {
                    return Err(PagetextError::ocr(format!(
                        "Tesseract produced no searchable output at {}",
                        searchable.path().display()
                    )));
                }
                self.recovery.recover(searchable.path()).await?
            }
        };

        tracing::debug!(chars = text.len(), "OCR finished");

        Ok(OcrOutput { text, mode })
    }
}
