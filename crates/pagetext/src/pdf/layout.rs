//! Text recovery from OCR-produced searchable PDFs via `pdftotext`.

use crate::core::artifacts::{DerivedArtifact, append_extension};
use crate::core::config::ToolsConfig;
use crate::process::{ToolInvocation, ToolRunner};
use crate::text::decode_utf8_lossy_ignore;
use crate::{PagetextError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Runs `pdftotext -layout -nopgbrk` and reads back its output.
#[derive(Clone)]
pub struct LayoutTextRecovery {
    runner: Arc<dyn ToolRunner>,
    program: PathBuf,
    env: Vec<(String, OsString)>,
    timeout: Duration,
}

impl LayoutTextRecovery {
    pub fn new(runner: Arc<dyn ToolRunner>, tools: &ToolsConfig) -> Self {
        Self {
            runner,
            program: tools.pdftotext_program(),
            env: tools.library_env(&tools.pdftotext),
            timeout: tools.timeout(),
        }
    }

    pub fn invocation(&self, pdf: &Path, output: &Path) -> ToolInvocation {
        ToolInvocation::new(&self.program, self.timeout)
            .args(["-layout", "-nopgbrk", "-eol", "unix"])
            .arg(pdf.as_os_str())
            .arg(output.as_os_str())
            .envs(self.env.clone())
    }

    /// Extract the text layer of `pdf`, trimmed. The intermediate `<pdf>.txt` is removed
    /// before returning.
    ///
    /// # Errors
    ///
    /// `PagetextError::Ocr` if pdftotext fails or writes no output.
    pub async fn recover(&self, pdf: &Path) -> Result<String> {
        let text_file = DerivedArtifact::new(append_extension(pdf, "txt"));

        let output = self
            .runner
            .run(self.invocation(pdf, text_file.path()))
            .await
            .map_err(|e| PagetextError::ocr_with_source("pdftotext failed on searchable output", e))?;

        if !output.success() {
            return Err(PagetextError::ocr(format!(
                "pdftotext exited with {}: {}",
                output.status,
                output.stderr_lossy()
            )));
        }

        let bytes = tokio::fs::read(text_file.path())
            .await
            .map_err(|e| PagetextError::ocr_with_source("pdftotext produced no output", e))?;

        Ok(decode_utf8_lossy_ignore(&bytes).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::SystemToolRunner;

    #[test]
    fn test_invocation() {
        let recovery = LayoutTextRecovery::new(Arc::new(SystemToolRunner), &ToolsConfig::default());
        let invocation = recovery.invocation(Path::new("/tmp/page.png.pdf"), Path::new("/tmp/page.png.pdf.txt"));

        let args: Vec<String> = invocation
            .args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        assert_eq!(invocation.program, PathBuf::from("pdftotext"));
        assert_eq!(
            args,
            vec!["-layout", "-nopgbrk", "-eol", "unix", "/tmp/page.png.pdf", "/tmp/page.png.pdf.txt"]
        );
    }
}
