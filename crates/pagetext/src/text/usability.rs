//! Decides whether text pulled from a document's own text layer is worth keeping.
//!
//! Scanned documents often carry a text layer that holds nothing but the watermark
//! of the app that produced them. Such a page still has to go through OCR.

use crate::{PagetextError, Result};
use regex::{Regex, RegexBuilder};

/// Verdict of [`UsabilityFilter::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextUsability {
    /// Cleaned, non-empty text.
    Usable(String),
    /// Nothing substantive left; OCR must run.
    Unusable,
}

impl TextUsability {
    pub fn is_usable(&self) -> bool {
        matches!(self, TextUsability::Usable(_))
    }
}

/// Strips watermark phrases and judges the remainder.
#[derive(Debug, Clone)]
pub struct UsabilityFilter {
    patterns: Vec<Regex>,
}

impl UsabilityFilter {
    /// Compile case-insensitive literal matchers for `phrases`. Empty phrases are skipped.
    pub fn new<I, S>(phrases: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns = Vec::new();

        for phrase in phrases {
            let phrase = phrase.as_ref().trim();
            if phrase.is_empty() {
                continue;
            }

            let pattern = RegexBuilder::new(&regex::escape(phrase))
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    PagetextError::validation_with_source(format!("Invalid watermark phrase '{}'", phrase), e)
                })?;
            patterns.push(pattern);
        }

        Ok(Self { patterns })
    }

    /// Remove every watermark occurrence and trim surrounding whitespace.
    ///
    /// Removal repeats until nothing changes, so `clean(clean(t)) == clean(t)` even when
    /// deleting one occurrence splices two halves into a new one.
    pub fn clean(&self, text: &str) -> String {
        let mut current = text.trim().to_string();

        loop {
            let mut next = current.clone();
            for pattern in &self.patterns {
                next = pattern.replace_all(&next, "").into_owned();
            }
            let next = next.trim().to_string();

            if next == current {
                return current;
            }
            current = next;
        }
    }

    pub fn evaluate(&self, text: &str) -> TextUsability {
        let cleaned = self.clean(text);
        if cleaned.is_empty() {
            TextUsability::Unusable
        } else {
            TextUsability::Usable(cleaned)
        }
    }
}
