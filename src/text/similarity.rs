//! Edit-distance similarity and fuzzy token predicates.
//!
//! Two tiers: [`token_matches`] is permissive (any token plausibly appears),
//! [`token_near_match`] is conjunctive (every token has a close word). The
//! resolver uses the first to boost a candidate and the second to promote it
//! to a strong match.

use super::normalize::normalize;

/// Pairwise similarity at which a token counts as appearing in the text.
pub const TOKEN_MATCH_SIMILARITY: f64 = 0.65;
/// Pairwise similarity at which a token counts as a near match.
pub const NEAR_MATCH_SIMILARITY: f64 = 0.75;
/// Edit budget per token, as a fraction of the shorter string's length.
pub const NEAR_MATCH_EDIT_RATIO: f64 = 0.25;

/// Levenshtein distance in characters.
#[must_use]
pub fn edit_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Similarity in `[0, 1]` of the normalized forms of `a` and `b`.
///
/// Both empty yields `1.0`; exactly one empty yields `0.0`.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);
    normalized_similarity(&a, &b)
}

/// [`similarity`] for inputs that are already normalized.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn normalized_similarity(a: &str, b: &str) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    match (len_a, len_b) {
        (0, 0) => 1.0,
        (0, _) | (_, 0) => 0.0,
        _ => {
            let longest = len_a.max(len_b) as f64;
            (1.0 - edit_distance(a, b) as f64 / longest).clamp(0.0, 1.0)
        }
    }
}

/// `true` if any token of `term` plausibly appears among the words of `text`.
///
/// A token appears when it is a substring of a word, a word is a substring of
/// it, or their similarity reaches [`TOKEN_MATCH_SIMILARITY`].
#[must_use]
pub fn token_matches(term: &str, text: &str) -> bool {
    let term = normalize(term);
    let text = normalize(text);
    let words: Vec<&str> = text.split_whitespace().collect();
    term.split_whitespace().any(|token| {
        words.iter().any(|word| {
            word.contains(token)
                || token.contains(word)
                || normalized_similarity(token, word) >= TOKEN_MATCH_SIMILARITY
        })
    })
}

/// `true` if every token of `term` has a near-identical word in `text`.
///
/// A word is near when it is identical, within
/// `ceil(min(len_token, len_word) * NEAR_MATCH_EDIT_RATIO)` edits, or at least
/// [`NEAR_MATCH_SIMILARITY`] similar. An empty term never matches.
#[must_use]
pub fn token_near_match(term: &str, text: &str) -> bool {
    let term = normalize(term);
    let text = normalize(text);
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut tokens = term.split_whitespace().peekable();
    if tokens.peek().is_none() {
        return false;
    }
    tokens.all(|token| words.iter().any(|word| is_near(token, word)))
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn is_near(token: &str, word: &str) -> bool {
    if token == word {
        return true;
    }
    let shorter = token.chars().count().min(word.chars().count());
    let budget = (shorter as f64 * NEAR_MATCH_EDIT_RATIO).ceil() as usize;
    edit_distance(token, word) <= budget || normalized_similarity(token, word) >= NEAR_MATCH_SIMILARITY
}

#[cfg(test)]
#[path = "similarity_test.rs"]
mod tests;
