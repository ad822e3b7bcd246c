//! Intent classification — deterministic rule cascade over normalized text.
//!
//! ARCHITECTURE
//! ============
//! [`IntentClassifier::analyze`] runs its rules in a fixed order and returns
//! on the first hit:
//!
//! 0. small talk (greeting, farewell, thanks)
//! 1. follow-up on a title named in the last assistant message
//! 2. count questions
//! 3. recommend / trending
//! 4. detail, search and explicit recommend keyword groups
//! 5. list / enumerate
//! 6. fallback heuristics (author pattern, known category, whole-message title)
//!
//! The classifier is pure: no I/O, no clock, no randomness. The same
//! `(message, context)` pair always yields the same [`IntentAnalysis`].
//!
//! Keyword tables hold normalized phrases (lowercase, no diacritics), matched
//! on word boundaries against the normalized message.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use super::context::ConversationContext;
use super::extract::{extract_local, quoted_segments};
use crate::config::MatchTuning;
use crate::text::normalize::{contains_phrase, padded};
use crate::text::{normalize, similarity, token_matches, token_near_match};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CountBooks,
    CountAuthors,
    CountCategories,
    Recommend,
    AskAboutBook,
    SearchBook,
    List,
    ListBooks,
    FollowUp,
    GeneralChat,
    Greeting,
    Farewell,
    Thanks,
}

impl Intent {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CountBooks => "count_books",
            Self::CountAuthors => "count_authors",
            Self::CountCategories => "count_categories",
            Self::Recommend => "recommend",
            Self::AskAboutBook => "ask_about_book",
            Self::SearchBook => "search_book",
            Self::List => "list",
            Self::ListBooks => "list_books",
            Self::FollowUp => "follow_up",
            Self::GeneralChat => "general_chat",
            Self::Greeting => "greeting",
            Self::Farewell => "farewell",
            Self::Thanks => "thanks",
        }
    }

    #[must_use]
    pub fn is_count(self) -> bool {
        matches!(self, Self::CountBooks | Self::CountAuthors | Self::CountCategories)
    }

    /// Greeting, farewell and thanks bypass catalog resolution.
    #[must_use]
    pub fn is_small_talk(self) -> bool {
        matches!(self, Self::Greeting | Self::Farewell | Self::Thanks)
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search fields pulled out of a message. All optional; never absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    /// A title the user referred back to from an earlier reply.
    pub book_mentioned: Option<String>,
}

impl SearchParams {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.category.is_none() && self.book_mentioned.is_none()
    }

    /// The most specific term: title, mentioned book, author, then category.
    #[must_use]
    pub fn primary_term(&self) -> Option<&str> {
        self.title
            .as_deref()
            .or(self.book_mentioned.as_deref())
            .or(self.author.as_deref())
            .or(self.category.as_deref())
    }

    fn titled(title: impl Into<String>) -> Self {
        let title = title.into();
        Self { title: Some(title.clone()), book_mentioned: Some(title), ..Self::default() }
    }

    fn category(category: impl Into<String>) -> Self {
        Self { category: Some(category.into()), ..Self::default() }
    }
}

/// Structured reading of one user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentAnalysis {
    pub intent: Intent,
    /// Free-form tag, `|`-separated flags such as `rating|favorite`.
    pub query_type: String,
    pub search_params: SearchParams,
    /// Extra reference such as `count:23`.
    pub context_reference: Option<String>,
    /// Which rule fired; diagnostics only.
    pub explanation: String,
}

impl IntentAnalysis {
    fn new(intent: Intent, explanation: &str) -> Self {
        Self {
            intent,
            query_type: String::new(),
            search_params: SearchParams::default(),
            context_reference: None,
            explanation: explanation.to_string(),
        }
    }

    fn with_params(mut self, params: SearchParams) -> Self {
        self.search_params = params;
        self
    }

    fn with_query_type(mut self, query_type: impl Into<String>) -> Self {
        self.query_type = query_type.into();
        self
    }

    #[must_use]
    pub fn has_query_flag(&self, flag: &str) -> bool {
        self.query_type.split('|').any(|f| f == flag)
    }

    /// The `count:N` reference, if any.
    #[must_use]
    pub fn requested_count(&self) -> Option<u32> {
        self.context_reference.as_deref().and_then(parse_count_reference)
    }
}

/// Parse a `count:N` context reference.
#[must_use]
pub fn parse_count_reference(reference: &str) -> Option<u32> {
    reference.strip_prefix("count:")?.trim().parse().ok()
}

// =============================================================================
// KEYWORD TABLES
// =============================================================================

const GREETINGS: &[&str] = &["xin chao", "chao", "hello", "hi", "hey", "alo", "good morning", "good evening"];
const FAREWELLS: &[&str] = &["tam biet", "bye", "goodbye", "hen gap lai", "see you", "bai bai"];
const THANKS: &[&str] = &["cam on", "thanks", "thank you", "thank", "tks", "cam ta"];
/// Longer messages are never treated as small talk.
const SMALL_TALK_MAX_TOKENS: usize = 5;
/// Longer messages are never treated as follow-ups.
const FOLLOW_UP_MAX_TOKENS: usize = 8;

const QUANTITY_WORDS: &[&str] = &[
    "bao nhieu",
    "how many",
    "so luong",
    "tong so",
    "tong cong",
    "total",
    "count",
    "number of",
    "may cuon",
    "may quyen",
    "may dau sach",
    "may tac gia",
    "may the loai",
    "may loai",
];
const BOOK_NOUNS: &[&str] = &[
    "sach", "cuon", "quyen", "dau sach", "truyen", "tac pham", "book", "books", "title", "titles",
];
const AUTHOR_NOUNS: &[&str] = &["tac gia", "nha van", "author", "authors", "writer", "writers"];
const CATEGORY_NOUNS: &[&str] = &[
    "the loai", "danh muc", "chu de", "loai", "category", "categories", "genre", "genres",
];

const RATING_WORDS: &[&str] = &["danh gia", "rating", "rated", "hay nhat", "diem cao", "xep hang", "best"];
const FAVORITE_WORDS: &[&str] = &[
    "yeu thich",
    "favorite",
    "favourite",
    "favorites",
    "popular",
    "pho bien",
    "trending",
    "hot",
    "ban chay",
    "bestseller",
    "noi bat",
];
const TREND_WORDS: &[&str] = &["top"];

const RECOMMEND_WORDS: &[&str] = &[
    "goi y",
    "de xuat",
    "recommend",
    "suggest",
    "nen doc",
    "doc gi",
    "gioi thieu cho",
    "gioi thieu vai",
];
const DETAIL_WORDS: &[&str] = &[
    "noi dung",
    "gioi thieu",
    "thong tin",
    "chi tiet",
    "tom tat",
    "ke ve",
    "noi ve",
    "review",
    "tell me about",
    "details",
    "summary",
];
const SEARCH_WORDS: &[&str] = &[
    "tim", "tim kiem", "kiem", "search", "find", "look for", "co sach", "co cuon", "co quyen", "co truyen",
];
const LIST_WORDS: &[&str] = &[
    "liet ke", "danh sach", "list", "show", "ke ten", "ke ra", "cho xem", "hien thi", "tat ca", "all",
];

/// Phrases that point back at something the assistant just said.
const REFERENCE_WORDS: &[&str] = &[
    "cuon do",
    "cuon nay",
    "cuon kia",
    "quyen do",
    "quyen nay",
    "sach do",
    "sach nay",
    "cuon thu",
    "quyen thu",
    "that one",
    "this one",
    "that book",
    "this book",
    "it",
];
const ORDINALS: &[(&[&str], Ordinal)] = &[
    (&["dau tien", "thu nhat", "first"], Ordinal::At(0)),
    (&["thu hai", "thu 2", "second"], Ordinal::At(1)),
    (&["thu ba", "thu 3", "third"], Ordinal::At(2)),
    (&["cuoi cung", "cuoi", "last"], Ordinal::Last),
];

/// Genre keywords recognized even when the catalog does not list them.
const KNOWN_CATEGORY_KEYWORDS: &[&str] = &[
    "tieu thuyet",
    "trinh tham",
    "kinh di",
    "vien tuong",
    "khoa hoc",
    "lich su",
    "tam ly",
    "ky nang song",
    "thieu nhi",
    "van hoc",
    "ngon tinh",
    "fantasy",
    "romance",
    "mystery",
    "horror",
    "science fiction",
    "history",
    "self help",
    "poetry",
];

/// Words trimmed from the edges of a residual title.
pub(crate) const FILLER: &[&str] = &[
    "a", "ah", "an", "anh", "ban", "cac", "cai", "cho", "chi", "co", "con", "cuon", "di", "do", "duoc", "em",
    "gi", "giup", "ha", "hay", "khong", "kia", "la", "minh", "nao", "nay", "nhe", "nha", "nhung", "oi", "quyen",
    "sach", "sao", "thi", "toi", "ve", "voi", "vay", "xem", "me", "please", "the", "about", "book", "books", "of",
    "is", "what",
];

const SPELLED_NUMBERS: &[(&str, u32)] = &[
    ("mot", 1),
    ("hai", 2),
    ("ba", 3),
    ("bon", 4),
    ("tu", 4),
    ("nam", 5),
    ("sau", 6),
    ("bay", 7),
    ("tam", 8),
    ("chin", 9),
    ("muoi", 10),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("twenty", 20),
];
/// Intensifiers that may pad a greeting or a thank-you.
const POLITENESS: &[&str] = &["nhieu", "lam", "qua", "you", "so", "much", "very", "everyone"];

/// Words that may follow a spelled-out quantity.
const COUNTERS: &[&str] = &["cuon", "quyen", "dau", "sach", "book", "books", "titles"];

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{1,4})\b").expect("valid digits regex"));

static COUNTED_BOOKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,4}) (?:cuon|quyen|dau sach|sach|tac pham|books|titles)\b").expect("valid counted regex")
});

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d+[.)]|[-*•])\s*").expect("valid list marker regex"));

#[derive(Debug, Clone, Copy)]
enum Ordinal {
    At(usize),
    Last,
}

fn has_any(padded_text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| contains_phrase(padded_text, p))
}

// =============================================================================
// HELPERS
// =============================================================================

/// Strip keyword `groups` from `normalized`, then trim filler words off both
/// ends. What remains is taken as the subject of the message.
fn residual(normalized: &str, groups: &[&[&str]]) -> String {
    let mut phrases: Vec<&str> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    phrases.sort_by_key(|p| std::cmp::Reverse(p.len()));
    let mut text = padded(normalized);
    for phrase in phrases {
        let needle = format!(" {phrase} ");
        while text.contains(&needle) {
            text = text.replace(&needle, " ");
        }
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    let start = words.iter().position(|w| !FILLER.contains(w)).unwrap_or(words.len());
    let end = words.iter().rposition(|w| !FILLER.contains(w)).map_or(start, |i| i + 1);
    words[start..end.max(start)].join(" ")
}

/// Words of three or more characters; the permissive matcher ignores the rest.
fn significant(text: &str) -> String {
    normalize(text)
        .split_whitespace()
        .filter(|w| w.chars().count() >= 3)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Titles offered by an assistant message: quoted segments, or else the
/// comma/semicolon separated segments longer than two characters.
#[must_use]
pub fn candidate_titles(assistant_message: &str) -> Vec<String> {
    let quoted = quoted_segments(assistant_message);
    if !quoted.is_empty() {
        return quoted;
    }
    assistant_message
        .split([',', ';', '\n'])
        .map(|segment| {
            let segment = segment.rsplit(':').next().unwrap_or(segment).trim();
            LIST_MARKER.replace(segment, "").trim().trim_end_matches(['.', '!', '?']).trim().to_string()
        })
        .filter(|segment| segment.chars().count() > 2)
        .collect()
}

fn spelled_number(word: &str) -> Option<u32> {
    SPELLED_NUMBERS
        .iter()
        .find_map(|(spelled, n)| (*spelled == word).then_some(*n))
}

/// Quantity stated in a normalized message: digits anywhere, or a spelled-out
/// number directly before a counter word ("nam cuon", "ten books").
fn parse_quantity(normalized: &str) -> Option<u32> {
    if let Some(caps) = DIGITS.captures(normalized) {
        return caps[1].parse().ok();
    }
    let words: Vec<&str> = normalized.split_whitespace().collect();
    words
        .windows(2)
        .find_map(|pair| if COUNTERS.contains(&pair[1]) { spelled_number(pair[0]) } else { None })
}

/// Quantity implied by an earlier reply such as "có 23 cuốn sách".
fn implied_quantity(normalized_prior: &str) -> Option<u32> {
    COUNTED_BOOKS
        .captures(normalized_prior)
        .and_then(|caps| caps[1].parse().ok())
}

// =============================================================================
// CLASSIFIER
// =============================================================================

/// Rule cascade configured with the catalog's category names.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    /// `(display name, normalized name)`, longest normalized name first.
    categories: Vec<(String, String)>,
    follow_up_similarity: f64,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(Vec::<String>::new(), &MatchTuning::default())
    }
}

impl IntentClassifier {
    #[must_use]
    pub fn new<I, S>(categories: I, tuning: &MatchTuning) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut categories: Vec<(String, String)> = categories
            .into_iter()
            .map(|name| {
                let name: String = name.into();
                let norm = normalize(&name);
                (name, norm)
            })
            .filter(|(_, norm)| !norm.is_empty())
            .collect();
        categories.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.1.cmp(&b.1)));
        Self { categories, follow_up_similarity: tuning.follow_up_similarity }
    }

    /// Classify `message` given the conversation so far.
    #[must_use]
    pub fn analyze(&self, message: &str, context: &ConversationContext) -> IntentAnalysis {
        let normalized = normalize(message);
        let text = padded(&normalized);
        let token_count = normalized.split_whitespace().count();
        let prior = context.last_assistant_message().map(|m| m.content()).unwrap_or("");

        if token_count == 0 {
            return IntentAnalysis::new(Intent::GeneralChat, "empty message");
        }
        if let Some(analysis) = small_talk(&normalized, &text, token_count) {
            return analysis;
        }
        if let Some(analysis) = self.follow_up(message, &normalized, &text, token_count, prior) {
            return analysis;
        }
        if let Some(analysis) = self.count_query(message, &text) {
            return analysis;
        }
        if let Some(analysis) = self.trending(&text) {
            return analysis;
        }
        if let Some(analysis) = self.keyword_groups(message, &normalized, &text, prior) {
            return analysis;
        }
        if let Some(analysis) = self.list_query(&normalized, &text, prior) {
            return analysis;
        }
        self.fallback(message, &text)
    }

    /// Known category named in `padded_text`: catalog names first, then the
    /// built-in genre keywords.
    fn mentioned_category(&self, padded_text: &str) -> Option<String> {
        self.categories
            .iter()
            .find(|(_, norm)| contains_phrase(padded_text, norm))
            .map(|(name, _)| name.clone())
            .or_else(|| {
                KNOWN_CATEGORY_KEYWORDS
                    .iter()
                    .find(|k| contains_phrase(padded_text, k))
                    .map(|k| (*k).to_string())
            })
    }

    /// The catalog category named in `text`, only when exactly one is.
    fn single_category_in(&self, text: &str) -> Option<String> {
        let text = padded(&normalize(text));
        let mut hits = self
            .categories
            .iter()
            .filter(|(_, norm)| contains_phrase(&text, norm));
        let (name, _) = hits.next()?;
        hits.next().is_none().then(|| name.clone())
    }

    fn is_category_name(&self, candidate: &str) -> Option<String> {
        let norm = normalize(candidate);
        self.categories
            .iter()
            .find(|(_, c)| *c == norm)
            .map(|(name, _)| name.clone())
    }

    // -------------------------------------------------------------------------
    // Rule 1: follow-up
    // -------------------------------------------------------------------------

    fn follow_up(
        &self,
        message: &str,
        normalized: &str,
        text: &str,
        token_count: usize,
        prior: &str,
    ) -> Option<IntentAnalysis> {
        if prior.is_empty() || token_count > FOLLOW_UP_MAX_TOKENS {
            return None;
        }
        // Fresh questions of another kind are not replies to a list.
        if [QUANTITY_WORDS, LIST_WORDS, TREND_WORDS, RATING_WORDS, FAVORITE_WORDS, RECOMMEND_WORDS]
            .iter()
            .any(|group| has_any(text, group))
        {
            return None;
        }
        let candidates = candidate_titles(prior);
        if candidates.is_empty() {
            return None;
        }

        if let Some(pick) = ordinal_pick(text, &candidates).or_else(|| {
            (has_any(text, REFERENCE_WORDS) || mentions_it(message)).then(|| candidates[0].clone())
        }) {
            let params = SearchParams { book_mentioned: Some(pick), ..SearchParams::default() };
            return Some(
                IntentAnalysis::new(Intent::FollowUp, "refers back to a title from the last reply")
                    .with_params(params)
                    .with_query_type("detail"),
            );
        }

        let content = residual(normalized, &[DETAIL_WORDS, SEARCH_WORDS]);
        if content.is_empty() {
            return None;
        }
        let pick = self.match_candidate(&content, &candidates)?;
        if let Some(category) = self.is_category_name(pick) {
            return Some(
                IntentAnalysis::new(Intent::SearchBook, "picked a category from the last reply")
                    .with_params(SearchParams::category(category))
                    .with_query_type("search"),
            );
        }
        Some(
            IntentAnalysis::new(Intent::AskAboutBook, "names a title from the last reply")
                .with_params(SearchParams::titled(pick.clone()))
                .with_query_type("detail"),
        )
    }

    /// Strict match first, then plain similarity, then the permissive token test.
    fn match_candidate<'c>(&self, content: &str, candidates: &'c [String]) -> Option<&'c String> {
        candidates
            .iter()
            .find(|c| token_near_match(content, c))
            .or_else(|| {
                candidates
                    .iter()
                    .find(|c| similarity(content, c) > self.follow_up_similarity)
            })
            .or_else(|| {
                let content = significant(content);
                if content.is_empty() {
                    return None;
                }
                candidates
                    .iter()
                    .find(|c| token_matches(&content, &significant(c)))
            })
    }

    // -------------------------------------------------------------------------
    // Rule 2: counts
    // -------------------------------------------------------------------------

    fn count_query(&self, message: &str, text: &str) -> Option<IntentAnalysis> {
        if !has_any(text, QUANTITY_WORDS) {
            return None;
        }
        let local = extract_local(message).unwrap_or_default();
        let author = local.author;
        let category = local.category.or_else(|| self.mentioned_category(text));

        // "how many authors" vs "how many books by <author>".
        if has_any(text, AUTHOR_NOUNS) && author.is_none() {
            return Some(IntentAnalysis::new(Intent::CountAuthors, "quantity question about authors").with_query_type("count"));
        }
        if has_any(text, CATEGORY_NOUNS) && category.is_none() {
            return Some(
                IntentAnalysis::new(Intent::CountCategories, "quantity question about categories").with_query_type("count"),
            );
        }
        if has_any(text, BOOK_NOUNS) || author.is_some() || category.is_some() {
            let params = SearchParams { author, category, ..SearchParams::default() };
            return Some(
                IntentAnalysis::new(Intent::CountBooks, "quantity question about books")
                    .with_params(params)
                    .with_query_type("count"),
            );
        }
        None
    }

    // -------------------------------------------------------------------------
    // Rule 3: recommend / trending
    // -------------------------------------------------------------------------

    fn trending(&self, text: &str) -> Option<IntentAnalysis> {
        let rating = has_any(text, RATING_WORDS);
        let favorite = has_any(text, FAVORITE_WORDS);
        if !rating && !favorite && !has_any(text, TREND_WORDS) {
            return None;
        }
        let query_type = match (rating, favorite) {
            (true, false) => "rating",
            (false, true) => "favorite",
            _ => "rating|favorite",
        };
        let params = self
            .mentioned_category(text)
            .map(SearchParams::category)
            .unwrap_or_default();
        Some(
            IntentAnalysis::new(Intent::Recommend, "ranking keywords")
                .with_params(params)
                .with_query_type(query_type),
        )
    }

    // -------------------------------------------------------------------------
    // Rule 4: detail / search / explicit recommend
    // -------------------------------------------------------------------------

    fn keyword_groups(&self, message: &str, normalized: &str, text: &str, prior: &str) -> Option<IntentAnalysis> {
        if has_any(text, RECOMMEND_WORDS) {
            let params = extract_local(message)
                .or_else(|| self.mentioned_category(text).map(SearchParams::category))
                .unwrap_or_default();
            return Some(
                IntentAnalysis::new(Intent::Recommend, "explicit recommendation request")
                    .with_params(params)
                    .with_query_type("rating"),
            );
        }

        if has_any(text, DETAIL_WORDS) {
            let params = extract_local(message).or_else(|| {
                let subject = residual(normalized, &[DETAIL_WORDS]);
                (!subject.is_empty()).then(|| SearchParams::titled(subject))
            });
            if let Some(mut params) = params {
                if params.book_mentioned.is_none() {
                    params.book_mentioned = params.title.clone();
                }
                return Some(
                    IntentAnalysis::new(Intent::AskAboutBook, "detail keywords")
                        .with_params(params)
                        .with_query_type("detail"),
                );
            }
            // "tell me more" with nothing named: the last offered title.
            if let Some(first) = candidate_titles(prior).into_iter().next() {
                let params = SearchParams { book_mentioned: Some(first), ..SearchParams::default() };
                return Some(
                    IntentAnalysis::new(Intent::FollowUp, "detail request about the last reply")
                        .with_params(params)
                        .with_query_type("detail"),
                );
            }
            return Some(IntentAnalysis::new(Intent::AskAboutBook, "detail keywords without a subject").with_query_type("detail"));
        }

        if has_any(text, SEARCH_WORDS) {
            let params = extract_local(message)
                .or_else(|| {
                    let subject = residual(normalized, &[SEARCH_WORDS]);
                    let subject_text = padded(&subject);
                    self.mentioned_category(&subject_text)
                        .filter(|c| normalize(c) == subject)
                        .map(SearchParams::category)
                        .or_else(|| (!subject.is_empty()).then(|| SearchParams { title: Some(subject), ..SearchParams::default() }))
                })
                .unwrap_or_default();
            return Some(
                IntentAnalysis::new(Intent::SearchBook, "search keywords")
                    .with_params(params)
                    .with_query_type("search"),
            );
        }
        None
    }

    // -------------------------------------------------------------------------
    // Rule 5: list / enumerate
    // -------------------------------------------------------------------------

    fn list_query(&self, normalized: &str, text: &str, prior: &str) -> Option<IntentAnalysis> {
        if !has_any(text, LIST_WORDS) {
            return None;
        }
        let prior_norm = normalize(prior);
        let prior_text = padded(&prior_norm);
        let asks_categories = has_any(text, CATEGORY_NOUNS) && !has_any(text, BOOK_NOUNS);
        let quantity = parse_quantity(normalized);
        let about_books = !asks_categories
            && (has_any(text, BOOK_NOUNS)
                || quantity.is_some()
                || has_any(&prior_text, BOOK_NOUNS)
                || DIGITS.is_match(&prior_norm));

        if !about_books {
            return Some(IntentAnalysis::new(Intent::List, "enumerate categories").with_query_type("list"));
        }

        let mut analysis = IntentAnalysis::new(Intent::ListBooks, "enumerate books").with_query_type("list");
        analysis.context_reference = quantity
            .or_else(|| implied_quantity(&prior_norm))
            .map(|n| format!("count:{n}"));
        let category = self
            .mentioned_category(text)
            .or_else(|| self.single_category_in(prior));
        if let Some(category) = category {
            analysis.search_params = SearchParams::category(category);
        }
        Some(analysis)
    }

    // -------------------------------------------------------------------------
    // Rule 6: fallback
    // -------------------------------------------------------------------------

    fn fallback(&self, message: &str, text: &str) -> IntentAnalysis {
        if let Some(params) = extract_local(message) {
            return IntentAnalysis::new(Intent::SearchBook, "extracted search fields")
                .with_params(params)
                .with_query_type("search");
        }
        if let Some(category) = self.mentioned_category(text) {
            return IntentAnalysis::new(Intent::SearchBook, "known category keyword")
                .with_params(SearchParams::category(category))
                .with_query_type("search");
        }
        let title = message.trim().to_string();
        IntentAnalysis::new(Intent::SearchBook, "whole message as title")
            .with_params(SearchParams { title: Some(title), ..SearchParams::default() })
            .with_query_type("search")
    }
}

/// Small talk only when nothing but greeting, thanks or farewell phrases and
/// filler remains; "hi, how many books?" is a question.
fn small_talk(normalized: &str, text: &str, token_count: usize) -> Option<IntentAnalysis> {
    if token_count > SMALL_TALK_MAX_TOKENS {
        return None;
    }
    let rest = residual(normalized, &[FAREWELLS, THANKS, GREETINGS]);
    if rest.split_whitespace().any(|w| !FILLER.contains(&w) && !POLITENESS.contains(&w)) {
        return None;
    }
    if has_any(text, FAREWELLS) {
        return Some(IntentAnalysis::new(Intent::Farewell, "farewell phrase"));
    }
    if has_any(text, THANKS) {
        return Some(IntentAnalysis::new(Intent::Thanks, "thanks phrase"));
    }
    if has_any(text, GREETINGS) {
        return Some(IntentAnalysis::new(Intent::Greeting, "greeting phrase"));
    }
    None
}

/// The Vietnamese pronoun "nó" as a whole word. Normalization folds it into
/// English "no", so this reads the raw message.
fn mentions_it(message: &str) -> bool {
    message
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| w.nfc().eq("nó".chars()))
}

fn ordinal_pick(text: &str, candidates: &[String]) -> Option<String> {
    ORDINALS.iter().find_map(|(phrases, ordinal)| {
        if !has_any(text, phrases) {
            return None;
        }
        match ordinal {
            Ordinal::At(i) => candidates.get(*i).cloned(),
            Ordinal::Last => candidates.last().cloned(),
        }
    })
}

#[cfg(test)]
#[path = "intent_test.rs"]
mod tests;
