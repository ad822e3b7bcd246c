//! Parameter extraction — title / author / category from free text.
//!
//! DESIGN
//! ======
//! Local rules run first and stop at the first hit: quoted text, explicit
//! `field:` markers, possessive "của/by <name>", then "titled/called <name>".
//! Only when all of them miss and a model is configured does the extractor
//! ask the model for a strict JSON object. Model output is untrusted: the
//! first balanced `{...}` is parsed and any failure means "nothing found".

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use super::intent::SearchParams;
use crate::llm::{self, LlmChat};

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]{2,})"|“([^”]{2,})”|«([^»]{2,})»"#).expect("valid quoted regex"));

static FIELD_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(author|tác giả|tac gia|category|thể loại|the loai|title|tên sách|ten sach)\s*:\s*([^,;\n]+)")
        .expect("valid field regex")
});

static POSSESSIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|\s)(?:của|cua|by)\s+([^,;!?\n]+)").expect("valid possessive regex")
});

/// Role words between "của" and the name itself.
static AUTHOR_ROLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:tác giả|tac gia|nhà văn|nha van|author|writer)\s+").expect("valid role regex"));

static TITLED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|\s)(?:titled|called|named|tên là|ten la|có tên|co ten|tựa đề|tua de|tựa là|tua la)\s+([^,;!?\n]+)")
        .expect("valid titled regex")
});

const EXTRACTION_SYSTEM: &str = "You extract book search fields from a library chat. \
    Reply with a single JSON object and nothing else.";

fn clean(value: &str) -> Option<String> {
    let trimmed = value
        .trim()
        .trim_end_matches(['.', '!', '?', ':'])
        .trim()
        .trim_matches(['"', '“', '”', '«', '»'])
        .trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// =============================================================================
// LOCAL RULES
// =============================================================================

/// Run the offline extraction rules in order; `None` when none applies.
#[must_use]
pub fn extract_local(message: &str) -> Option<SearchParams> {
    quoted_title(message)
        .or_else(|| field_markers(message))
        .or_else(|| possessive_author(message))
        .or_else(|| titled_marker(message))
}

/// Every quoted segment of `text`, in order of appearance.
pub(crate) fn quoted_segments(text: &str) -> Vec<String> {
    QUOTED
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .filter_map(|m| clean(m.as_str()))
        .collect()
}

fn quoted_title(message: &str) -> Option<SearchParams> {
    let caps = QUOTED.captures(message)?;
    let raw = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
    let title = clean(raw.as_str())?;
    Some(SearchParams { title: Some(title), ..SearchParams::default() })
}

fn field_markers(message: &str) -> Option<SearchParams> {
    let mut params = SearchParams::default();
    for caps in FIELD_MARKER.captures_iter(message) {
        let value = clean(&caps[2]);
        match crate::text::normalize(&caps[1]).as_str() {
            "author" | "tac gia" => params.author = params.author.or(value),
            "category" | "the loai" => params.category = params.category.or(value),
            _ => params.title = params.title.or(value),
        }
    }
    (!params.is_empty()).then_some(params)
}

/// Pronouns that follow "của/by" without naming an author.
const NOT_AN_AUTHOR: &[&str] = &["toi", "ban", "minh", "chung toi", "me", "you", "us", "them"];

fn possessive_author(message: &str) -> Option<SearchParams> {
    let caps = POSSESSIVE.captures(message)?;
    let author = clean(&AUTHOR_ROLE.replace(&caps[1], ""))?;
    if NOT_AN_AUTHOR.contains(&crate::text::normalize(&author).as_str()) {
        return None;
    }
    Some(SearchParams { author: Some(author), ..SearchParams::default() })
}

fn titled_marker(message: &str) -> Option<SearchParams> {
    let caps = TITLED.captures(message)?;
    let title = clean(&caps[1])?;
    Some(SearchParams { title: Some(title), ..SearchParams::default() })
}

// =============================================================================
// MODEL-ASSISTED EXTRACTION
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawExtraction {
    #[serde(default)]
    title: Option<serde_json::Value>,
    #[serde(default)]
    author: Option<serde_json::Value>,
    #[serde(default)]
    category: Option<serde_json::Value>,
}

fn json_field(value: Option<serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) => clean(&s),
        _ => None,
    }
}

pub(crate) fn extraction_prompt(message: &str, history: &str) -> String {
    format!(
        "Conversation so far:\n{history}\n\n\
         Latest user message: {message}\n\n\
         Return exactly one JSON object with the keys \"title\", \"author\" and \"category\". \
         Each value is a string taken from the conversation, or null when it is not mentioned. \
         Do not add other keys and do not write any text outside the object."
    )
}

/// The first balanced `{...}` substring of `text`, ignoring braces inside
/// JSON strings. Falls back to first `{` .. last `}` when unbalanced.
#[must_use]
pub fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0_usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a model reply into search params. Any failure yields `None`.
#[must_use]
pub fn parse_extraction(reply: &str) -> Option<SearchParams> {
    let object = first_json_object(reply)?;
    let raw: RawExtraction = match serde_json::from_str(object) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "extract: model reply is not valid JSON");
            return None;
        }
    };
    let params = SearchParams {
        title: json_field(raw.title),
        author: json_field(raw.author),
        category: json_field(raw.category),
        book_mentioned: None,
    };
    (!params.is_empty()).then_some(params)
}

/// Ask the model for structured fields. `None` on timeout, failure, or an
/// unusable reply.
pub async fn extract_with_llm(
    llm: &dyn LlmChat,
    message: &str,
    history: &str,
    max_tokens: u32,
    deadline: Duration,
) -> Option<SearchParams> {
    let reply = llm::complete(llm, EXTRACTION_SYSTEM, &extraction_prompt(message, history), max_tokens, deadline).await;
    if reply.is_empty() {
        return None;
    }
    let params = parse_extraction(&reply);
    debug!(found = params.is_some(), "extract: model-assisted extraction");
    params
}

/// Local rules, then the model when configured.
pub async fn extract(
    message: &str,
    llm: Option<&dyn LlmChat>,
    history: &str,
    max_tokens: u32,
    deadline: Duration,
) -> Option<SearchParams> {
    if let Some(params) = extract_local(message) {
        return Some(params);
    }
    let llm = llm?;
    extract_with_llm(llm, message, history, max_tokens, deadline).await
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
