//! Optical character recognition through the Tesseract command-line tool.
pub mod tesseract;
pub mod types;
pub mod validation;

pub use tesseract::TesseractOcr;
pub use types::{OcrOutput, OcrOutputMode, PSMMode};
