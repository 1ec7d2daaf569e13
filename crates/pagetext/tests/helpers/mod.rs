//! Shared fakes for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use pagetext::core::fetch::DocumentFetcher;
use pagetext::process::{ToolInvocation, ToolOutput, ToolRunner};
use pagetext::{
    DelegationRequest, ExtractionResult, OcrDelegate, OcrPolicy, PagePipeline, PagetextError, PipelineConfig, Result,
};
use std::collections::HashMap;
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

pub const OCR_TEXT: &str = "Recognized from sidecar";
pub const SEARCHABLE_TEXT: &str = "Recognized from searchable PDF";

/// Build a PDF with one page per entry; an empty entry yields a page without text.
pub fn sample_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let operations = if text.is_empty() {
            Vec::new()
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// In-memory documents keyed by URI.
#[derive(Default)]
pub struct FakeFetcher {
    documents: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, uri: &str, bytes: Vec<u8>) -> Self {
        self.documents.insert(uri.to_string(), bytes);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentFetcher for FakeFetcher {
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.documents
            .get(uri)
            .cloned()
            .ok_or_else(|| PagetextError::fetch(format!("GET {} returned HTTP 404 Not Found", uri)))
    }
}

fn exit_status(code: i32) -> ExitStatus {
    ExitStatus::from_raw(code << 8)
}

/// Plays the part of gs, tesseract and pdftotext by writing the files they would write.
pub struct ScriptedRunner {
    raster_bytes: Vec<u8>,
    gs_exit: i32,
    tesseract_exit: i32,
    tesseract_writes_output: bool,
    pdftotext_exit: i32,
    ocr_text: Vec<u8>,
    searchable_text: Vec<u8>,
    invocations: Mutex<Vec<ToolInvocation>>,
}

impl Default for ScriptedRunner {
    fn default() -> Self {
        Self {
            raster_bytes: b"\x89PNG\r\n\x1a\nrendered".to_vec(),
            gs_exit: 0,
            tesseract_exit: 0,
            tesseract_writes_output: true,
            pdftotext_exit: 0,
            ocr_text: format!("  {}\n\n", OCR_TEXT).into_bytes(),
            searchable_text: format!("\n   {}   \n\x0c", SEARCHABLE_TEXT).into_bytes(),
            invocations: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes gs writes as the rendered page; empty simulates a blank render.
    pub fn with_raster_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.raster_bytes = bytes;
        self
    }

    pub fn with_gs_exit(mut self, code: i32) -> Self {
        self.gs_exit = code;
        self
    }

    pub fn with_tesseract_exit(mut self, code: i32) -> Self {
        self.tesseract_exit = code;
        self
    }

    /// tesseract exits 0 but writes neither the sidecar nor the searchable PDF.
    pub fn without_ocr_output(mut self) -> Self {
        self.tesseract_writes_output = false;
        self
    }

    pub fn with_pdftotext_exit(mut self, code: i32) -> Self {
        self.pdftotext_exit = code;
        self
    }

    pub fn with_ocr_text(mut self, text: Vec<u8>) -> Self {
        self.ocr_text = text;
        self
    }

    pub fn with_searchable_text(mut self, text: Vec<u8>) -> Self {
        self.searchable_text = text;
        self
    }

    /// Names of the tools invoked, in order.
    pub fn tools(&self) -> Vec<String> {
        self.invocations
            .lock()
            .unwrap()
            .iter()
            .map(ToolInvocation::display_name)
            .collect()
    }

    pub fn invocations(&self) -> Vec<ToolInvocation> {
        self.invocations.lock().unwrap().clone()
    }

    fn output(code: i32) -> ToolOutput {
        ToolOutput {
            status: exit_status(code),
            stdout: Vec::new(),
            stderr: if code == 0 { Vec::new() } else { b"scripted failure".to_vec() },
        }
    }
}

fn with_extension(path: &Path, extension: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".");
    os.push(extension);
    PathBuf::from(os)
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    async fn run(&self, invocation: ToolInvocation) -> Result<ToolOutput> {
        self.invocations.lock().unwrap().push(invocation.clone());

        match invocation.display_name().as_str() {
            "gs" => {
                let output = PathBuf::from(invocation.arg_after("-o").unwrap());
                if self.gs_exit == 0 {
                    std::fs::write(&output, &self.raster_bytes)?;
                }
                Ok(Self::output(self.gs_exit))
            }
            "tesseract" => {
                let base = PathBuf::from(&invocation.args[1]);
                let searchable = invocation.args.last().is_some_and(|arg| arg == "pdf");
                if self.tesseract_exit == 0 && self.tesseract_writes_output {
                    if searchable {
                        std::fs::write(with_extension(&base, "pdf"), b"%PDF-1.5 searchable")?;
                    } else {
                        std::fs::write(with_extension(&base, "txt"), &self.ocr_text)?;
                    }
                }
                Ok(Self::output(self.tesseract_exit))
            }
            "pdftotext" => {
                let output = PathBuf::from(invocation.args.last().unwrap());
                if self.pdftotext_exit == 0 {
                    std::fs::write(&output, &self.searchable_text)?;
                }
                Ok(Self::output(self.pdftotext_exit))
            }
            other => Err(PagetextError::MissingDependency(other.to_string())),
        }
    }
}

/// Remote worker stand-in returning a fixed answer.
pub struct FakeDelegate {
    answer: std::result::Result<ExtractionResult, String>,
    requests: Mutex<Vec<DelegationRequest>>,
}

impl FakeDelegate {
    pub fn answering(result: ExtractionResult) -> Self {
        Self {
            answer: Ok(result),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            answer: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<DelegationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl OcrDelegate for FakeDelegate {
    fn worker_name(&self) -> &str {
        "fake-worker"
    }

    async fn delegate(&self, request: &DelegationRequest) -> Result<ExtractionResult> {
        self.requests.lock().unwrap().push(request.clone());
        self.answer.clone().map_err(PagetextError::delegation)
    }
}

/// Send pipeline logs to the test harness output. `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

/// Config rooted in an isolated temp dir.
pub fn local_config(temp_dir: &Path) -> PipelineConfig {
    PipelineConfig {
        temp_dir: Some(temp_dir.to_path_buf()),
        ..Default::default()
    }
}

pub fn remote_config(temp_dir: &Path) -> PipelineConfig {
    let mut config = local_config(temp_dir);
    config.ocr_policy = OcrPolicy::Remote;
    config.delegation.endpoint = Some("http://127.0.0.1:9/ocr".to_string());
    config
}

pub fn pipeline(config: PipelineConfig, fetcher: Arc<FakeFetcher>, runner: Arc<ScriptedRunner>) -> PagePipeline {
    init_tracing();
    PagePipeline::builder(config)
        .fetcher(fetcher)
        .tool_runner(runner)
        .build()
        .unwrap()
}

pub fn remote_pipeline(
    config: PipelineConfig,
    fetcher: Arc<FakeFetcher>,
    runner: Arc<ScriptedRunner>,
    delegate: Arc<FakeDelegate>,
) -> PagePipeline {
    init_tracing();
    PagePipeline::builder(config)
        .fetcher(fetcher)
        .tool_runner(runner)
        .delegate(delegate)
        .build()
        .unwrap()
}

pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}
