//! Text normalization.
//!
//! Lowercase, decompose (NFD), drop combining marks, map every
//! non-alphanumeric character to a space, collapse whitespace. `đ`/`Đ` is a
//! base letter rather than a composed one, so it is folded to `d` explicitly.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Canonicalize `text` for matching. Idempotent.
#[must_use]
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut spaced = String::with_capacity(lowered.len());
    for c in lowered.nfd() {
        if is_combining_mark(c) {
            continue;
        }
        let c = if c == 'đ' { 'd' } else { c };
        spaced.push(if c.is_alphanumeric() { c } else { ' ' });
    }
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pad normalized text with spaces so phrase lookups respect word boundaries.
pub(crate) fn padded(normalized: &str) -> String {
    format!(" {normalized} ")
}

/// `true` if the normalized `phrase` occurs in `padded_text` as whole words.
pub(crate) fn contains_phrase(padded_text: &str, phrase: &str) -> bool {
    padded_text.contains(&format!(" {phrase} "))
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
