//! Validation of Tesseract parameters.

use super::types::PSMMode;
use crate::{PagetextError, Result};
use std::collections::HashSet;

lazy_static::lazy_static! {
    /// Language codes of the traineddata files published for Tesseract.
    pub static ref TESSERACT_LANGUAGE_CODES: HashSet<&'static str> = {
        [
            "afr", "amh", "ara", "asm", "aze", "aze_cyrl", "bel", "ben", "bod", "bos",
            "bre", "bul", "cat", "ceb", "ces", "chi_sim", "chi_tra", "chr", "cos", "cym",
            "dan", "deu", "div", "dzo", "ell", "eng", "enm", "epo", "equ", "est",
            "eus", "fao", "fas", "fil", "fin", "fra", "frk", "frm", "fry", "gla",
            "gle", "glg", "grc", "guj", "hat", "heb", "hin", "hrv", "hun", "hye",
            "iku", "ind", "isl", "ita", "ita_old", "jav", "jpn", "kan", "kat", "kat_old",
            "kaz", "khm", "kir", "kmr", "kor", "lao", "lat", "lav", "lit", "ltz",
            "mal", "mar", "mkd", "mlt", "mon", "mri", "msa", "mya", "nep", "nld",
            "nor", "oci", "ori", "osd", "pan", "pol", "por", "pus", "que", "ron",
            "rus", "san", "sin", "slk", "slv", "snd", "spa", "spa_old", "sqi", "srp",
            "srp_latn", "sun", "swa", "swe", "syr", "tam", "tat", "tel", "tgk", "tha",
            "tir", "ton", "tur", "uig", "ukr", "urd", "uzb", "uzb_cyrl", "vie", "yid",
            "yor",
        ]
        .into_iter()
        .collect()
    };
}

/// Validate a Tesseract language specification such as `eng` or `eng+deu`.
pub fn validate_language_code(lang_code: &str) -> Result<()> {
    if lang_code.trim().is_empty() {
        return Err(PagetextError::validation("OCR language must not be empty"));
    }

    for code in lang_code.split('+') {
        if !TESSERACT_LANGUAGE_CODES.contains(code) {
            return Err(PagetextError::validation(format!(
                "Language code '{}' is not supported by Tesseract",
                code
            )));
        }
    }
    Ok(())
}

/// Validate a page segmentation mode (0..=13).
pub fn validate_psm(psm: u8) -> Result<PSMMode> {
    PSMMode::from_u8(psm).map_err(PagetextError::validation)
}
