//! Page rasterization with Ghostscript.

use crate::core::artifacts::TempArtifact;
use crate::core::config::{RasterizerConfig, ToolsConfig};
use crate::process::{ToolInvocation, ToolRunner};
use crate::{PagetextError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A rendered page on disk. The PNG is deleted when this value is dropped.
#[derive(Debug)]
pub struct RasterImage {
    artifact: TempArtifact,
}

impl RasterImage {
    pub fn path(&self) -> &Path {
        self.artifact.path()
    }
}

/// Renders single pages of vector documents to PNG.
#[derive(Clone)]
pub struct PageRasterizer {
    runner: Arc<dyn ToolRunner>,
    program: PathBuf,
    timeout: std::time::Duration,
    settings: RasterizerConfig,
    temp_dir: Option<PathBuf>,
}

impl PageRasterizer {
    pub fn new(
        runner: Arc<dyn ToolRunner>,
        tools: &ToolsConfig,
        settings: RasterizerConfig,
        temp_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            runner,
            program: tools.ghostscript_program(),
            timeout: tools.timeout(),
            settings,
            temp_dir,
        }
    }

    /// Ghostscript invocation rendering page `page_index` of `document` into `output`.
    pub fn invocation(&self, document: &Path, page_index: u32, output: &Path) -> ToolInvocation {
        let page_number = u64::from(page_index) + 1;
        let alpha_bits = self.settings.alpha_bits;

        ToolInvocation::new(&self.program, self.timeout)
            .args([
                "-sDEVICE=png16m".to_string(),
                format!("-dFirstPage={}", page_number),
                format!("-dLastPage={}", page_number),
                "-dINTERPOLATE".to_string(),
                format!("-r{}", self.settings.dpi),
            ])
            .arg("-o")
            .arg(output.as_os_str())
            .args([
                "-dNOPAUSE".to_string(),
                "-dSAFER".to_string(),
                "-c".to_string(),
                format!("{} setvmthreshold", self.settings.vm_threshold),
                format!("-dGraphicsAlphaBits={}", alpha_bits),
                format!("-dTextAlphaBits={}", alpha_bits),
                "-f".to_string(),
            ])
            .arg(document.as_os_str())
    }

    /// Render one page.
    ///
    /// # Errors
    ///
    /// `PagetextError::Rasterization` if Ghostscript fails or leaves a missing or empty
    /// image. The output is checked even when the tool exits successfully.
    #[tracing::instrument(skip(self), fields(dpi = self.settings.dpi))]
    pub async fn rasterize(&self, document: &Path, page_index: u32) -> Result<RasterImage> {
        let artifact = TempArtifact::create(self.temp_dir.as_deref(), ".png")?;
        let invocation = self.invocation(document, page_index, artifact.path());

        let output = self
            .runner
            .run(invocation)
            .await
            .map_err(|e| {
                PagetextError::rasterization_with_source(format!("Ghostscript failed on page {}", page_index), e)
            })?;

        if !output.success() {
            return Err(PagetextError::rasterization(format!(
                "Ghostscript exited with {} on page {}: {}",
                output.status,
                page_index,
                output.stderr_lossy()
            )));
        }

        let size = tokio::fs::metadata(artifact.path()).await.map(|meta| meta.len()).unwrap_or(0);
        if size == 0 {
            return Err(PagetextError::rasterization(format!(
                "Ghostscript produced an empty image for page {}",
                page_index
            )));
        }

        tracing::debug!(bytes = size, "Rasterized page");

        Ok(RasterImage { artifact })
    }
}
