//! Embedded text layer extraction.
//!
//! Reads the text layer of one page with `lopdf`. This is synchronous and CPU-bound;
//! async callers run it on the blocking pool.

use super::error::{PdfError, Result};
use crate::text::retain_ascii;
use lopdf::Document;

/// Extract the text of the page at zero-based `page_index`.
///
/// The result keeps ASCII characters only and is trimmed. An empty string means the
/// page has no usable text layer.
///
/// # Errors
///
/// - `PdfError::InvalidPdf` if the bytes are not a parseable PDF
/// - `PdfError::PageNotFound` if the index is past the last page
/// - `PdfError::TextExtractionFailed` if the page's content stream can't be decoded
pub fn extract_page_text(pdf_bytes: &[u8], page_index: u32) -> Result<String> {
    let document = Document::load_mem(pdf_bytes)?;
    let pages = document.get_pages();

    // lopdf numbers pages from 1
    let page_number = page_index
        .checked_add(1)
        .filter(|number| pages.contains_key(number))
        .ok_or(PdfError::PageNotFound(page_index))?;

    let raw = document
        .extract_text(&[page_number])
        .map_err(|e| PdfError::TextExtractionFailed(format!("page {}: {}", page_index, e)))?;

    Ok(retain_ascii(&raw).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    fn build_pdf(pages: &[&str]) -> Vec<u8> {
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

        let mut kids = Vec::new();
        for text in pages {
            let mut operations = Vec::new();
            if !text.is_empty() {
                operations = vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ];
            }
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

    #[test]
    fn test_extract_page_text() {
        let pdf = build_pdf(&["First page", "Second page"]);
        assert!(extract_page_text(&pdf, 0).unwrap().contains("First page"));
        assert!(extract_page_text(&pdf, 1).unwrap().contains("Second page"));
    }

    #[test]
    fn test_page_without_text_is_empty() {
        let pdf = build_pdf(&[""]);
        assert_eq!(extract_page_text(&pdf, 0).unwrap(), "");
    }

    #[test]
    fn test_page_out_of_range() {
        let pdf = build_pdf(&["only page"]);
        let err = extract_page_text(&pdf, 1).unwrap_err();
        assert!(matches!(err, PdfError::PageNotFound(1)));

        let err = extract_page_text(&pdf, u32::MAX).unwrap_err();
        assert!(matches!(err, PdfError::PageNotFound(_)));
    }

    #[test]
    fn test_garbage_is_invalid_pdf() {
        let err = extract_page_text(b"<html>not a pdf</html>", 0).unwrap_err();
        assert!(matches!(err, PdfError::InvalidPdf(_)), "{:?}", err);
    }
}
