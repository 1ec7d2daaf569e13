//! Configuration loading and management.
//!
//! [`PipelineConfig`] is built once at startup (file, then `PAGETEXT_*` environment
//! overrides), validated, and passed explicitly to every component. Nothing below the
//! entry points reads the process environment.

use crate::ocr::validation::{validate_language_code, validate_psm};
use crate::{PagetextError, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the configuration file looked up by [`PipelineConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "pagetext.toml";

/// Watermark stamped on pages by a popular phone scanner app.
pub const DEFAULT_WATERMARK: &str = "scanned by camscanner";

/// What happens once a page is known to need OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrPolicy {
    /// Rasterize and OCR in this process.
    #[default]
    Local,
    /// Hand the page to a remote OCR worker.
    Remote,
}

impl std::str::FromStr for OcrPolicy {
    type Err = PagetextError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(OcrPolicy::Local),
            "remote" => Ok(OcrPolicy::Remote),
            other => Err(PagetextError::validation(format!(
                "Invalid OCR policy '{}', expected 'local' or 'remote'",
                other
            ))),
        }
    }
}

/// Main pipeline configuration.
///
/// # Example
///
/// ```rust
/// use pagetext::core::config::{OcrPolicy, PipelineConfig};
///
/// let config: PipelineConfig = toml::from_str(r#"
///     ocr_policy = "remote"
///
///     [delegation]
///     endpoint = "http://ocr-worker:8000/ocr"
/// "#).unwrap();
///
/// assert_eq!(config.ocr_policy, OcrPolicy::Remote);
/// assert!(config.direct_text);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Try the embedded text layer of vector documents before OCR
    #[serde(default = "default_true")]
    pub direct_text: bool,

    /// Where OCR runs when a page needs it
    #[serde(default)]
    pub ocr_policy: OcrPolicy,

    /// Directory for temporary artifacts (None = system temp dir)
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    /// Phrases removed from direct text before the usability check (case-insensitive)
    #[serde(default = "default_watermarks")]
    pub watermark_phrases: Vec<String>,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub rasterizer: RasterizerConfig,

    #[serde(default)]
    pub ocr: OcrConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub delegation: DelegationConfig,
}

/// Locations of the external command-line tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Directory holding the tool binaries (None = resolve through PATH)
    #[serde(default)]
    pub bin_dir: Option<PathBuf>,

    /// Directory holding one shared-library folder per tool (`<lib_dir>/tesseract`, ...)
    #[serde(default)]
    pub lib_dir: Option<PathBuf>,

    #[serde(default = "default_ghostscript")]
    pub ghostscript: String,

    #[serde(default = "default_tesseract")]
    pub tesseract: String,

    #[serde(default = "default_pdftotext")]
    pub pdftotext: String,

    /// Tesseract language data (None = `<lib_dir>/tesseract` when `lib_dir` is set)
    #[serde(default)]
    pub tessdata_dir: Option<PathBuf>,

    /// Upper bound for a single tool invocation
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

/// Page rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterizerConfig {
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Ghostscript VM threshold in bytes
    #[serde(default = "default_vm_threshold")]
    pub vm_threshold: u64,

    /// Anti-aliasing bits for graphics and text (1, 2 or 4)
    #[serde(default = "default_alpha_bits")]
    pub alpha_bits: u8,
}

/// OCR engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Tesseract language code (e.g. "eng", "deu")
    #[serde(default = "default_eng")]
    pub language: String,

    /// Tesseract page segmentation mode
    #[serde(default = "default_psm")]
    pub psm: u8,
}

/// Document download settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Skip TLS certificate verification
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

/// Remote OCR worker settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationConfig {
    /// Name of the worker, used in logs
    #[serde(default = "default_worker_name")]
    pub worker_name: String,

    /// URL the delegation request is POSTed to
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Time budget for the whole request/response exchange
    #[serde(default = "default_delegation_timeout")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}
fn default_watermarks() -> Vec<String> {
    vec![DEFAULT_WATERMARK.to_string()]
}
fn default_ghostscript() -> String {
    "gs".to_string()
}
fn default_tesseract() -> String {
    "tesseract".to_string()
}
fn default_pdftotext() -> String {
    "pdftotext".to_string()
}
fn default_tool_timeout() -> u64 {
    120
}
fn default_dpi() -> u32 {
    300
}
fn default_vm_threshold() -> u64 {
    64 * 1024 * 1024
}
fn default_alpha_bits() -> u8 {
    4
}
fn default_eng() -> String {
    "eng".to_string()
}
fn default_psm() -> u8 {
    12
}
fn default_fetch_timeout() -> u64 {
    60
}
fn default_worker_name() -> String {
    "pagetext-ocr".to_string()
}
fn default_delegation_timeout() -> u64 {
    300
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            direct_text: true,
            ocr_policy: OcrPolicy::Local,
            temp_dir: None,
            watermark_phrases: default_watermarks(),
            tools: ToolsConfig::default(),
            rasterizer: RasterizerConfig::default(),
            ocr: OcrConfig::default(),
            fetch: FetchConfig::default(),
            delegation: DelegationConfig::default(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            bin_dir: None,
            lib_dir: None,
            ghostscript: default_ghostscript(),
            tesseract: default_tesseract(),
            pdftotext: default_pdftotext(),
            tessdata_dir: None,
            timeout_secs: default_tool_timeout(),
        }
    }
}

impl Default for RasterizerConfig {
    fn default() -> Self {
        Self {
            dpi: default_dpi(),
            vm_threshold: default_vm_threshold(),
            alpha_bits: default_alpha_bits(),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: default_eng(),
            psm: default_psm(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            accept_invalid_certs: false,
        }
    }
}

impl Default for DelegationConfig {
    fn default() -> Self {
        Self {
            worker_name: default_worker_name(),
            endpoint: None,
            timeout_secs: default_delegation_timeout(),
        }
    }
}

impl ToolsConfig {
    /// Path of a tool binary: `<bin_dir>/<name>` or the bare name for a PATH lookup.
    pub fn program(&self, name: &str) -> PathBuf {
        match &self.bin_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }

    pub fn ghostscript_program(&self) -> PathBuf {
        self.program(&self.ghostscript)
    }

    pub fn tesseract_program(&self) -> PathBuf {
        self.program(&self.tesseract)
    }

    pub fn pdftotext_program(&self) -> PathBuf {
        self.program(&self.pdftotext)
    }

    /// `LD_LIBRARY_PATH` entry for a tool, when a library directory is configured.
    pub fn library_env(&self, tool: &str) -> Vec<(String, OsString)> {
        match &self.lib_dir {
            Some(dir) => vec![("LD_LIBRARY_PATH".to_string(), dir.join(tool).into_os_string())],
            None => Vec::new(),
        }
    }

    pub fn resolved_tessdata_dir(&self) -> Option<PathBuf> {
        self.tessdata_dir
            .clone()
            .or_else(|| self.lib_dir.as_ref().map(|dir| dir.join("tesseract")))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `PagetextError::Validation` if the file can't be read or is invalid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;

        toml::from_str(&content)
            .map_err(|e| PagetextError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;

        serde_yaml_ng::from_str(&content)
            .map_err(|e| PagetextError::validation(format!("Invalid YAML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;

        serde_json::from_str(&content)
            .map_err(|e| PagetextError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration, picking the parser from the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        match extension.as_deref() {
            Some("toml") => Self::from_toml_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(PagetextError::validation(format!(
                "Unsupported config file format: {}. Supported formats: .toml, .yaml, .yml, .json",
                path.display()
            ))),
        }
    }

    /// Discover `pagetext.toml` in the current directory or its parents.
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(PagetextError::Io)?;

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }

    /// Explicit file, else discovered file, else defaults; then environment overrides.
    ///
    /// Not validated: callers that adjust the result further (CLI flags, the worker's
    /// forced local policy) validate once they are done, which [`PagePipeline`] does on
    /// construction.
    ///
    /// [`PagePipeline`]: crate::PagePipeline
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::discover()?.unwrap_or_default(),
        };

        config.apply_env_overrides()
    }

    /// [`resolve`](Self::resolve) followed by [`validate`](Self::validate).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = Self::resolve(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay `PAGETEXT_*` environment variables.
    pub fn apply_env_overrides(self) -> Result<Self> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Overlay overrides from an arbitrary key lookup.
    ///
    /// Recognised keys: `PAGETEXT_DIRECT_TEXT`, `PAGETEXT_OCR_POLICY`, `PAGETEXT_TEMP_DIR`,
    /// `PAGETEXT_BIN_DIR`, `PAGETEXT_LIB_DIR`, `PAGETEXT_TESSDATA_DIR`,
    /// `PAGETEXT_TOOL_TIMEOUT_SECS`, `PAGETEXT_OCR_LANGUAGE`, `PAGETEXT_OCR_PSM`,
    /// `PAGETEXT_FETCH_TIMEOUT_SECS`, `PAGETEXT_DELEGATION_WORKER`,
    /// `PAGETEXT_DELEGATION_ENDPOINT`, `PAGETEXT_DELEGATION_TIMEOUT_SECS`.
    pub fn apply_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = get("PAGETEXT_DIRECT_TEXT") {
            self.direct_text = parse_bool("PAGETEXT_DIRECT_TEXT", &value)?;
        }
        if let Some(value) = get("PAGETEXT_OCR_POLICY") {
            self.ocr_policy = value.parse()?;
        }
        if let Some(value) = get("PAGETEXT_TEMP_DIR") {
            self.temp_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = get("PAGETEXT_BIN_DIR") {
            self.tools.bin_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = get("PAGETEXT_LIB_DIR") {
            self.tools.lib_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = get("PAGETEXT_TESSDATA_DIR") {
            self.tools.tessdata_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = get("PAGETEXT_TOOL_TIMEOUT_SECS") {
            self.tools.timeout_secs = parse_number("PAGETEXT_TOOL_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = get("PAGETEXT_OCR_LANGUAGE") {
            self.ocr.language = value.trim().to_string();
        }
        if let Some(value) = get("PAGETEXT_OCR_PSM") {
            self.ocr.psm = parse_number("PAGETEXT_OCR_PSM", &value)?;
        }
        if let Some(value) = get("PAGETEXT_FETCH_TIMEOUT_SECS") {
            self.fetch.timeout_secs = parse_number("PAGETEXT_FETCH_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = get("PAGETEXT_DELEGATION_WORKER") {
            self.delegation.worker_name = value.trim().to_string();
        }
        if let Some(value) = get("PAGETEXT_DELEGATION_ENDPOINT") {
            self.delegation.endpoint = Some(value.trim().to_string());
        }
        if let Some(value) = get("PAGETEXT_DELEGATION_TIMEOUT_SECS") {
            self.delegation.timeout_secs = parse_number("PAGETEXT_DELEGATION_TIMEOUT_SECS", &value)?;
        }

        Ok(self)
    }

    /// Check the configuration for values the tools would reject.
    pub fn validate(&self) -> Result<()> {
        if !(72..=1200).contains(&self.rasterizer.dpi) {
            return Err(PagetextError::validation(format!(
                "Rasterizer DPI must be between 72 and 1200, got {}",
                self.rasterizer.dpi
            )));
        }

        if ![1, 2, 4].contains(&self.rasterizer.alpha_bits) {
            return Err(PagetextError::validation(format!(
                "Rasterizer alpha bits must be 1, 2 or 4, got {}",
                self.rasterizer.alpha_bits
            )));
        }

        validate_language_code(&self.ocr.language)?;
        validate_psm(self.ocr.psm)?;

        if self.tools.timeout_secs == 0 || self.fetch.timeout_secs == 0 || self.delegation.timeout_secs == 0 {
            return Err(PagetextError::validation("Timeouts must be greater than zero"));
        }

        if self.ocr_policy == OcrPolicy::Remote && self.delegation.endpoint.is_none() {
            return Err(PagetextError::validation(
                "OCR policy 'remote' requires delegation.endpoint (or PAGETEXT_DELEGATION_ENDPOINT)",
            ));
        }

        Ok(())
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| PagetextError::validation(format!("Failed to read config file {}: {}", path.display(), e)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(PagetextError::validation(format!("{} must be a boolean, got '{}'", key, other))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| PagetextError::validation(format!("{} must be a non-negative integer, got '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert!(config.direct_text);
        assert_eq!(config.ocr_policy, OcrPolicy::Local);
        assert_eq!(config.watermark_phrases, vec![DEFAULT_WATERMARK.to_string()]);
        assert_eq!(config.rasterizer.dpi, 300);
        assert_eq!(config.rasterizer.vm_threshold, 67_108_864);
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.ocr.psm, 12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("pagetext.toml");
        fs::write(
            &config_path,
            r#"
direct_text = false
ocr_policy = "remote"

[tools]
bin_dir = "/opt/task/bin"
lib_dir = "/opt/task/lib"

[delegation]
worker_name = "textractor-ocr"
endpoint = "http://worker:8000/ocr"
timeout_secs = 30
"#,
        )
        .unwrap();

        let config = PipelineConfig::from_toml_file(&config_path).unwrap();
        assert!(!config.direct_text);
        assert_eq!(config.ocr_policy, OcrPolicy::Remote);
        assert_eq!(config.delegation.worker_name, "textractor-ocr");
        assert_eq!(config.delegation.timeout_secs, 30);
        assert_eq!(config.tools.tesseract_program(), PathBuf::from("/opt/task/bin/tesseract"));
        assert_eq!(
            config.tools.resolved_tessdata_dir(),
            Some(PathBuf::from("/opt/task/lib/tesseract"))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_dispatches_on_extension() {
        let dir = tempdir().unwrap();

        let json_path = dir.path().join("config.json");
        fs::write(&json_path, r#"{"ocr": {"language": "deu", "psm": 1}}"#).unwrap();
        let config = PipelineConfig::from_file(&json_path).unwrap();
        assert_eq!(config.ocr.language, "deu");
        assert_eq!(config.ocr.psm, 1);

        let yaml_path = dir.path().join("config.yaml");
        fs::write(&yaml_path, "rasterizer:\n  dpi: 200\n").unwrap();
        let config = PipelineConfig::from_file(&yaml_path).unwrap();
        assert_eq!(config.rasterizer.dpi, 200);

        let ini_path = dir.path().join("config.ini");
        fs::write(&ini_path, "x=1").unwrap();
        assert!(matches!(
            PipelineConfig::from_file(&ini_path),
            Err(PagetextError::Validation { .. })
        ));
    }

    #[test]
    fn test_invalid_toml_is_validation_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("pagetext.toml");
        fs::write(&config_path, "direct_text = [").unwrap();
        let err = PipelineConfig::from_toml_file(&config_path).unwrap_err();
        assert!(matches!(err, PagetextError::Validation { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PAGETEXT_OCR_POLICY", "Remote"),
            ("PAGETEXT_DIRECT_TEXT", "no"),
            ("PAGETEXT_BIN_DIR", "/var/task/bin"),
            ("PAGETEXT_DELEGATION_ENDPOINT", " http://worker/ocr "),
            ("PAGETEXT_DELEGATION_TIMEOUT_SECS", "45"),
            ("PAGETEXT_OCR_LANGUAGE", ""),
        ]
        .into_iter()
        .collect();

        let config = PipelineConfig::default()
            .apply_overrides_from(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.ocr_policy, OcrPolicy::Remote);
        assert!(!config.direct_text);
        assert_eq!(config.tools.bin_dir, Some(PathBuf::from("/var/task/bin")));
        assert_eq!(config.delegation.endpoint.as_deref(), Some("http://worker/ocr"));
        assert_eq!(config.delegation.timeout_secs, 45);
        assert_eq!(config.ocr.language, "eng");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let result = PipelineConfig::default().apply_overrides_from(|key| {
            (key == "PAGETEXT_TOOL_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(PagetextError::Validation { .. })));
    }

    #[test]
    fn test_remote_policy_requires_endpoint() {
        let config = PipelineConfig {
            ocr_policy: OcrPolicy::Remote,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("delegation.endpoint"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PipelineConfig::default();
        config.rasterizer.dpi = 10;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.ocr.psm = 14;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.ocr.language = "klingon".to_string();
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.tools.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_library_env() {
        let tools = ToolsConfig {
            lib_dir: Some(PathBuf::from("/var/task/lib")),
            ..Default::default()
        };
        let env = tools.library_env("pdftotext");
        assert_eq!(env.len(), 1);
        assert_eq!(env[0].0, "LD_LIBRARY_PATH");
        assert_eq!(env[0].1, OsString::from("/var/task/lib/pdftotext"));

        assert!(ToolsConfig::default().library_env("tesseract").is_empty());
        assert_eq!(ToolsConfig::default().ghostscript_program(), PathBuf::from("gs"));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("local".parse::<OcrPolicy>().unwrap(), OcrPolicy::Local);
        assert_eq!(" REMOTE ".parse::<OcrPolicy>().unwrap(), OcrPolicy::Remote);
        assert!("lambda".parse::<OcrPolicy>().is_err());
    }
}
