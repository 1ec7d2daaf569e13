//! PDF processing.
//!
//! - **Text extraction** ([`text`]): read the embedded text layer of one page with `lopdf`
//! - **Rendering** ([`rendering`]): rasterize one page with Ghostscript for OCR
//! - **Layout text recovery** ([`layout`]): pull text back out of OCR-produced PDFs
pub mod error;
pub mod layout;
pub mod rendering;
pub mod text;

pub use error::PdfError;
pub use layout::LayoutTextRecovery;
pub use rendering::{PageRasterizer, RasterImage};
pub use text::extract_page_text;
