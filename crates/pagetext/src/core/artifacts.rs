//! Scoped temporary artifacts.
//!
//! Every file the pipeline puts on disk (the downloaded document, the rendered page,
//! OCR sidecars, searchable PDFs, recovered text) is owned by a guard that removes it
//! when dropped. Guards are dropped on every exit path, including early returns via `?`,
//! so no request leaves files behind in the shared temporary directory.

use crate::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempPath};

const TEMP_PREFIX: &str = "pagetext-";

/// A uniquely named temporary file created by this process.
#[derive(Debug)]
pub struct TempArtifact {
    path: TempPath,
}

impl TempArtifact {
    /// Create an empty, uniquely named file in `dir` (or the system temp dir).
    pub fn create(dir: Option<&Path>, suffix: &str) -> Result<Self> {
        let mut builder = Builder::new();
        builder.prefix(TEMP_PREFIX).suffix(suffix);

        let file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    /// Create a uniquely named file holding `bytes`.
    pub fn with_contents(dir: Option<&Path>, suffix: &str, bytes: &[u8]) -> Result<Self> {
        let mut builder = Builder::new();
        builder.prefix(TEMP_PREFIX).suffix(suffix);

        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;

        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A file produced by an external tool at a predictable path.
///
/// The file may or may not exist; dropping the guard removes it if it does.
#[derive(Debug)]
pub struct DerivedArtifact {
    path: PathBuf,
}

impl DerivedArtifact {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

impl Drop for DerivedArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::trace!("Removed temporary artifact {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove temporary artifact {}: {}", self.path.display(), e),
        }
    }
}

/// `path` with `.<extra_extension>` appended to its full file name, e.g. `page.png` →
/// `page.png.txt`.
pub(crate) fn append_extension(path: &Path, extra_extension: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".");
    os.push(extra_extension);
    PathBuf::from(os)
}
