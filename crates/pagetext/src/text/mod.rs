//! Text normalization helpers.

pub mod usability;

pub use usability::{TextUsability, UsabilityFilter};

/// Decode UTF-8, silently dropping invalid byte sequences.
///
/// Unlike [`String::from_utf8_lossy`] no replacement character is inserted, so a
/// stray invalid byte between two words leaves no trace in the output.
pub fn decode_utf8_lossy_ignore(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());

    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }

    out
}

/// Keep only ASCII characters.
pub fn retain_ascii(text: &str) -> String {
    text.chars().filter(char::is_ascii).collect()
}
