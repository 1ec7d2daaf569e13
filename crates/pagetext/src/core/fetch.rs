//! Document retrieval.
//!
//! `http://` and `https://` URIs are downloaded with `reqwest`; `file://` URIs and
//! plain paths are read from the local filesystem.

use super::config::FetchConfig;
use super::format::ResolvedFormat;
use crate::{PagetextError, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::path::PathBuf;
use std::time::Duration;

/// Fetched bytes together with the format resolved from the URI.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub bytes: Vec<u8>,
    pub format: ResolvedFormat,
}

/// Retrieves the bytes behind a document URI.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// # Errors
    ///
    /// `PagetextError::Fetch` if the document can't be retrieved.
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>>;
}

/// Where a URI points.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    Remote(Url),
    Local(PathBuf),
}

fn locate(uri: &str) -> Result<Location> {
    match Url::parse(uri) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Location::Remote(url)),
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map(Location::Local)
            .map_err(|_| PagetextError::fetch(format!("Invalid file URI: {}", uri))),
        // Single-letter schemes are Windows drive letters
        Ok(url) if url.scheme().len() > 1 => Err(PagetextError::fetch(format!(
            "Unsupported URI scheme '{}' in {}",
            url.scheme(),
            uri
        ))),
        _ => Ok(Location::Local(PathBuf::from(uri))),
    }
}

/// Default fetcher: HTTP(S) via `reqwest`, local files via `tokio::fs`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        if config.accept_invalid_certs {
            tracing::warn!("TLS certificate verification is disabled for document downloads");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| PagetextError::fetch_with_source("Failed to build HTTP client", e))?;

        Ok(Self { client })
    }

    async fn download(&self, url: Url) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PagetextError::fetch_with_source(format!("Request to {} failed", url), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PagetextError::fetch(format!("GET {} returned HTTP {}", url, status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PagetextError::fetch_with_source(format!("Failed to read body of {}", url), e))?;

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        let bytes = match locate(uri)? {
            Location::Remote(url) => self.download(url).await?,
            Location::Local(path) => tokio::fs::read(&path)
                .await
                .map_err(|e| PagetextError::fetch_with_source(format!("Failed to read {}", path.display()), e))?,
        };

        tracing::debug!(bytes = bytes.len(), "Fetched document");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_locate() {
        assert!(matches!(locate("https://example.com/a.pdf").unwrap(), Location::Remote(_)));
        assert!(matches!(locate("http://example.com/a.pdf").unwrap(), Location::Remote(_)));
        assert_eq!(locate("/tmp/a.pdf").unwrap(), Location::Local(PathBuf::from("/tmp/a.pdf")));
        assert_eq!(locate("docs/a.pdf").unwrap(), Location::Local(PathBuf::from("docs/a.pdf")));
        assert!(locate("ftp://example.com/a.pdf").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_file_uri() {
        assert_eq!(
            locate("file:///var/data/a.pdf").unwrap(),
            Location::Local(PathBuf::from("/var/data/a.pdf"))
        );
    }

    #[tokio::test]
    async fn test_fetch_local_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.png");
        std::fs::write(&path, b"\x89PNG").unwrap();

        let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
        let bytes = fetcher.fetch(path.to_str().unwrap()).await.unwrap();
        assert_eq!(bytes, b"\x89PNG");
    }

    #[tokio::test]
    async fn test_fetch_missing_file_is_fetch_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.pdf");

        let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
        let err = fetcher.fetch(path.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, PagetextError::Fetch { .. }), "{:?}", err);
    }
}
