//! Response composer and grounding validator.
//!
//! DESIGN
//! ======
//! Deterministic replies are built only from `QueryResultSet` fields, so they
//! can never name a book, author or category the catalog did not return.
//! Model-written replies go through [`is_grounded`] before they are used:
//! when the result set carries any entity, the reply must mention at least
//! one of them or it is thrown away.
//!
//! Titles are always written in double quotes. The intent classifier reads
//! them back out of the previous reply for follow-up detection.

use std::fmt::Write;

use rand::Rng;

use super::catalog::BookItem;
use super::intent::{Intent, IntentAnalysis};
use super::resolver::QueryResultSet;
use crate::text::normalize;
use crate::text::normalize::{contains_phrase, padded};

/// The only failure a user ever sees.
pub const APOLOGY: &str = "Xin lỗi, mình chưa tìm thấy thông tin phù hợp trong thư viện.";

pub const FAREWELL_REPLY: &str = "Tạm biệt bạn, hẹn gặp lại!";
pub const THANKS_REPLY: &str = "Không có gì! Bạn cần tìm sách gì cứ hỏi mình nhé.";

pub const GREETING_REPLIES: [&str; 3] = [
    "Xin chào! Mình có thể giúp bạn tìm sách, gợi ý sách hay hoặc thống kê thư viện.",
    "Chào bạn! Bạn đang muốn tìm cuốn sách nào?",
    "Xin chào, mình là trợ lý thư viện. Hôm nay bạn muốn đọc gì?",
];

pub const MAX_RECOMMENDED: usize = 5;
pub const MAX_LISTED: usize = 20;
pub const MAX_SUMMARY: usize = 3;

// =============================================================================
// SMALL TALK
// =============================================================================

/// Canned reply for greeting, farewell and thanks; `None` for other intents.
pub fn small_talk_reply<R: Rng + ?Sized>(intent: Intent, rng: &mut R) -> Option<&'static str> {
    match intent {
        Intent::Greeting => Some(GREETING_REPLIES[rng.random_range(0..GREETING_REPLIES.len())]),
        Intent::Farewell => Some(FAREWELL_REPLY),
        Intent::Thanks => Some(THANKS_REPLY),
        _ => None,
    }
}

// =============================================================================
// DETERMINISTIC PATH
// =============================================================================

fn book_line(index: usize, book: &BookItem) -> String {
    match book.author.as_deref() {
        Some(author) => format!("{index}. \"{}\" - {author}", book.title),
        None => format!("{index}. \"{}\"", book.title),
    }
}

fn push_lines<'a>(out: &mut String, books: impl IntoIterator<Item = &'a BookItem>, limit: usize) -> usize {
    let mut shown = 0;
    for (i, book) in books.into_iter().take(limit).enumerate() {
        let _ = write!(out, "\n{}", book_line(i + 1, book));
        shown += 1;
    }
    shown
}

fn sentence(text: &str) -> String {
    let text = text.trim();
    if text.ends_with(['.', '!', '?']) { text.to_string() } else { format!("{text}.") }
}

/// Multi-sentence description of one book.
fn describe(book: &BookItem, related: &[BookItem]) -> String {
    let mut out = match book.author.as_deref() {
        Some(author) => format!("\"{}\" là sách của {author}.", book.title),
        None => format!("\"{}\" hiện có trong thư viện.", book.title),
    };
    if let Some(category) = book.category.as_deref() {
        let _ = write!(out, " Thể loại: {category}.");
    }
    if let Some(rating) = book.rating {
        let _ = write!(out, " Đánh giá: {rating:.1}/5.");
    }
    if book.favorite_count > 0 {
        let _ = write!(out, " Có {} lượt yêu thích.", book.favorite_count);
    }
    if let Some(synopsis) = book.synopsis.as_deref().filter(|s| !s.trim().is_empty()) {
        let _ = write!(out, " Nội dung: {}", sentence(synopsis));
    }
    if !related.is_empty() {
        let names: Vec<String> = related.iter().map(|b| format!("\"{}\"", b.title)).collect();
        let _ = write!(out, " Cùng thể loại còn có: {}.", names.join(", "));
    }
    out
}

fn category_offer(results: &QueryResultSet) -> String {
    format!(
        "Mình chưa tìm thấy cuốn sách phù hợp. Các thể loại hiện có: {}.",
        results.category_names().join(", ")
    )
}

fn recommend(analysis: &IntentAnalysis, results: &QueryResultSet) -> Option<String> {
    let favorite_first = analysis.has_query_flag("favorite");
    let (header, books) = if !results.books.is_empty() {
        ("Gợi ý cho bạn:", &results.books)
    } else if favorite_first && !results.trending_books.is_empty() {
        ("Những cuốn sách được yêu thích nhất:", &results.trending_books)
    } else if !results.top_rated_books.is_empty() {
        ("Những cuốn sách được đánh giá cao nhất:", &results.top_rated_books)
    } else if !results.trending_books.is_empty() {
        ("Những cuốn sách được yêu thích nhất:", &results.trending_books)
    } else {
        return None;
    };
    let mut out = header.to_string();
    push_lines(&mut out, books, MAX_RECOMMENDED);
    Some(out)
}

fn list_books(analysis: &IntentAnalysis, results: &QueryResultSet) -> Option<String> {
    if results.books.is_empty() {
        return None;
    }
    let total = results.total_books.max(results.books.len() as u64);
    let mut out = match analysis.search_params.category.as_deref() {
        Some(category) => format!("Có {total} cuốn sách thuộc thể loại {category}:"),
        None => format!("Thư viện có {total} cuốn sách:"),
    };
    let shown = push_lines(&mut out, &results.books, MAX_LISTED) as u64;
    if total > shown {
        let _ = write!(out, "\n... và {} cuốn khác.", total - shown);
    }
    Some(out)
}

/// Up to three titles as a generic result summary.
fn summary(results: &QueryResultSet) -> Option<String> {
    let books: Vec<&BookItem> = if results.books.is_empty() {
        results
            .focused_book
            .iter()
            .chain(&results.top_rated_books)
            .chain(&results.trending_books)
            .collect()
    } else {
        results.books.iter().collect()
    };
    if books.is_empty() {
        return None;
    }
    let total = results.total_books.max(books.len() as u64);
    let mut out = format!("Mình tìm thấy {total} cuốn sách phù hợp:");
    let shown = push_lines(&mut out, books, MAX_SUMMARY) as u64;
    if total > shown {
        let _ = write!(out, "\n... và {} cuốn khác.", total - shown);
    }
    Some(out)
}

fn count_sentence(analysis: &IntentAnalysis, results: &QueryResultSet) -> Option<String> {
    let params = &analysis.search_params;
    match analysis.intent {
        Intent::CountBooks => Some(match (params.author.as_deref(), params.category.as_deref()) {
            (Some(author), _) => format!("Thư viện hiện có {} cuốn sách của {author}.", results.total_books),
            (None, Some(category)) => {
                format!("Thư viện hiện có {} cuốn sách thuộc thể loại {category}.", results.total_books)
            }
            (None, None) => format!("Thư viện hiện có {} cuốn sách.", results.total_books),
        }),
        Intent::CountAuthors => Some(format!("Thư viện hiện có {} tác giả.", results.total_authors)),
        Intent::CountCategories => Some(format!("Thư viện hiện có {} thể loại.", results.all_categories.len())),
        _ => None,
    }
}

fn answer(analysis: &IntentAnalysis, results: &QueryResultSet) -> Option<String> {
    match analysis.intent {
        intent if intent.is_count() => count_sentence(analysis, results),
        Intent::Recommend => recommend(analysis, results),
        Intent::AskAboutBook | Intent::FollowUp => results
            .best_book()
            .map(|book| describe(book, &results.related_books)),
        Intent::List => (!results.all_categories.is_empty())
            .then(|| format!("Các thể loại hiện có: {}.", results.category_names().join(", "))),
        Intent::ListBooks => list_books(analysis, results),
        _ => summary(results),
    }
}

/// Template reply built only from `results`. Falls back to the category
/// offer, then to [`APOLOGY`].
#[must_use]
pub fn compose(analysis: &IntentAnalysis, results: &QueryResultSet) -> String {
    if results.answers(analysis.intent) {
        if let Some(reply) = answer(analysis, results) {
            return reply;
        }
    }
    fallback(results)
}

/// Reply when the intent itself could not be answered.
#[must_use]
pub fn fallback(results: &QueryResultSet) -> String {
    if let Some(reply) = summary(results) {
        return reply;
    }
    if !results.all_categories.is_empty() {
        return category_offer(results);
    }
    APOLOGY.to_string()
}

// =============================================================================
// GROUNDING
// =============================================================================

/// `true` when `reply` names at least one entity of `results`.
///
/// Entities are the book titles, or the category names when there are no
/// titles. With neither there is nothing to check against and the reply
/// passes. Matching is case-insensitive and also accepted on normalized text.
#[must_use]
pub fn is_grounded(reply: &str, results: &QueryResultSet) -> bool {
    let mut entities = results.titles();
    if entities.is_empty() {
        entities = results.category_names();
    }
    if entities.is_empty() {
        return true;
    }
    let lower = reply.to_lowercase();
    let normalized = padded(&normalize(reply));
    entities.iter().any(|entity| {
        let entity_norm = normalize(entity);
        lower.contains(&entity.to_lowercase()) || (!entity_norm.is_empty() && contains_phrase(&normalized, &entity_norm))
    })
}

// =============================================================================
// ASSISTED PROMPTS
// =============================================================================

pub const DATA_SYSTEM: &str = "You are the assistant of an online library. Reply in Vietnamese. \
    Use only the catalog data you are given. Never mention a book, author or category that is not in the data, \
    and write every title exactly as it appears.";

pub const NORMALIZE_SYSTEM: &str = "You rewrite library search requests. Reply with one line holding the \
    corrected book title, author name or category the user is looking for, and nothing else. \
    Reply NONE if the message is not asking about books.";

pub const FREEFORM_SYSTEM: &str = "You are the friendly assistant of an online library. Reply in Vietnamese \
    in at most three sentences. You have no catalog data for this message, so do not name any specific book, \
    author or category. Invite the user to ask about titles, authors or categories in the library.";

fn dump_books(out: &mut String, label: &str, books: &[BookItem]) {
    if books.is_empty() {
        return;
    }
    let _ = writeln!(out, "{label}:");
    for book in books {
        let _ = write!(out, "- \"{}\"", book.title);
        if let Some(author) = book.author.as_deref() {
            let _ = write!(out, " | author: {author}");
        }
        if let Some(category) = book.category.as_deref() {
            let _ = write!(out, " | category: {category}");
        }
        if let Some(rating) = book.rating {
            let _ = write!(out, " | rating: {rating:.1}");
        }
        let _ = writeln!(out, " | favorites: {}", book.favorite_count);
    }
}

/// Plain-text dump of everything in `results`.
#[must_use]
pub fn data_dump(results: &QueryResultSet) -> String {
    let mut out = String::new();
    if let Some(book) = &results.focused_book {
        dump_books(&mut out, "Focused book", std::slice::from_ref(book));
        if let Some(synopsis) = book.synopsis.as_deref() {
            let _ = writeln!(out, "Synopsis: {synopsis}");
        }
    }
    dump_books(&mut out, "Books", &results.books);
    dump_books(&mut out, "Related books", &results.related_books);
    dump_books(&mut out, "Top rated", &results.top_rated_books);
    dump_books(&mut out, "Most favorited", &results.trending_books);
    if results.total_books > 0 {
        let _ = writeln!(out, "Total books: {}", results.total_books);
    }
    if results.total_authors > 0 {
        let _ = writeln!(out, "Total authors: {}", results.total_authors);
    }
    if !results.all_categories.is_empty() {
        let _ = writeln!(out, "Categories: {}", results.category_names().join(", "));
    }
    out.trim_end().to_string()
}

#[must_use]
pub fn data_prompt(message: &str, history: &str, results: &QueryResultSet) -> String {
    format!(
        "Catalog data:\n{}\n\nConversation so far:\n{history}\n\nUser: {message}\n\n\
         Answer the user from the catalog data only.",
        data_dump(results)
    )
}

#[must_use]
pub fn normalize_prompt(message: &str, history: &str) -> String {
    format!("Conversation so far:\n{history}\n\nUser: {message}\n\nWhat is the user searching for?")
}

#[must_use]
pub fn freeform_prompt(message: &str, history: &str) -> String {
    format!("Conversation so far:\n{history}\n\nUser: {message}")
}

/// The search term in a normalization reply; `None` for blank or `NONE`.
#[must_use]
pub fn parse_normalized_query(reply: &str) -> Option<String> {
    let line = reply.lines().map(str::trim).find(|l| !l.is_empty())?;
    let term = line
        .trim_matches(['"', '\'', '“', '”', '`'])
        .trim_end_matches(['.', '!', '?'])
        .trim();
    if term.is_empty() || term.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(term.to_string())
    }
}

#[cfg(test)]
#[path = "compose_test.rs"]
mod tests;
