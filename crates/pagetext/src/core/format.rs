//! Document format resolution.
//!
//! The format of a document is derived from the file extension of its URI path. The
//! query string and fragment never take part, so `scan.pdf?download=1` resolves to PDF.
//! Resolution is pure: it performs no network, filesystem or process I/O.

use crate::{PagetextError, Result};
use once_cell::sync::Lazy;
use reqwest::Url;
use std::collections::HashMap;
use std::path::Path;

/// Formats the pipeline can process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Pdf,
    Png,
    Tiff,
    Jpeg,
}

/// How text is obtained for a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionStrategy {
    /// Vector documents: try the embedded text layer, then rasterize and OCR.
    DirectText,
    /// Raster images: OCR is the only way to get text.
    ImageOnly,
}

impl DocumentFormat {
    pub fn strategy(&self) -> ExtractionStrategy {
        match self {
            DocumentFormat::Pdf => ExtractionStrategy::DirectText,
            DocumentFormat::Png | DocumentFormat::Tiff | DocumentFormat::Jpeg => ExtractionStrategy::ImageOnly,
        }
    }
}

static EXT_TO_FORMAT: Lazy<HashMap<&'static str, DocumentFormat>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert("pdf", DocumentFormat::Pdf);

    m.insert("png", DocumentFormat::Png);
    m.insert("tiff", DocumentFormat::Tiff);
    m.insert("tif", DocumentFormat::Tiff);
    m.insert("jpg", DocumentFormat::Jpeg);
    m.insert("jpeg", DocumentFormat::Jpeg);

    m
});

/// A format resolved from a URI, with the lower-cased extension it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFormat {
    pub format: DocumentFormat,
    /// Lower-cased extension without the dot, e.g. `"tif"`.
    pub extension: String,
}

impl ResolvedFormat {
    pub fn strategy(&self) -> ExtractionStrategy {
        self.format.strategy()
    }

    /// Suffix used for temporary copies of the document, e.g. `".pdf"`.
    pub fn temp_suffix(&self) -> String {
        format!(".{}", self.extension)
    }
}

/// Extract the lower-cased extension of the last path segment of `uri`.
///
/// URIs without a scheme (or with a single-letter scheme, i.e. a Windows drive) are
/// treated as filesystem paths.
pub fn uri_extension(uri: &str) -> Option<String> {
    let path = match Url::parse(uri) {
        Ok(url) if url.scheme().len() > 1 => url.path().to_string(),
        _ => strip_query_and_fragment(uri).to_string(),
    };

    Path::new(&path)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_lowercase())
}

fn strip_query_and_fragment(uri: &str) -> &str {
    let end = uri.find(['?', '#']).unwrap_or(uri.len());
    &uri[..end]
}

/// Resolve the document format for `uri`.
///
/// # Errors
///
/// Returns `PagetextError::UnsupportedFormat` if the URI has no extension or the
/// extension is not supported.
pub fn resolve_format(uri: &str) -> Result<ResolvedFormat> {
    let extension = uri_extension(uri)
        .ok_or_else(|| PagetextError::UnsupportedFormat(format!("<{}> has no file extension", uri)))?;

    let format = EXT_TO_FORMAT.get(extension.as_str()).copied().ok_or_else(|| {
        PagetextError::UnsupportedFormat(format!("<{}> has unsupported extension \".{}\"", uri, extension))
    })?;

    Ok(ResolvedFormat { format, extension })
}

/// All supported extensions, sorted.
pub fn supported_extensions() -> Vec<&'static str> {
    let mut extensions: Vec<&'static str> = EXT_TO_FORMAT.keys().copied().collect();
    extensions.sort_unstable();
    extensions
}
