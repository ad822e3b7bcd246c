//! Catalog query resolver — structured intent to catalog reads.
//!
//! DESIGN
//! ======
//! Read-only and idempotent: the result is a function of the analysis and
//! the current catalog contents. Reads run sequentially. A failed read is
//! logged and treated as "no rows" so a broken catalog degrades to the
//! category offer or the apology instead of aborting the turn.
//!
//! RELAXED RETRY
//! =============
//! When every targeted read comes back empty but the message named
//! something, the term is split into tokens and matched against title,
//! author and synopsis of a bounded candidate set. Each candidate scores the
//! best field similarity, raised to `token_boost` on a permissive token hit
//! and to `near_boost` on a strict near match. An empty candidate set
//! broadens once to a fixed-size catalog sample with a lower keep threshold.

use tracing::{debug, warn};

use super::catalog::{BookFilter, BookItem, CatalogError, CatalogQuery, CategoryItem, Page};
use super::intent::{FILLER, Intent, IntentAnalysis, SearchParams};
use crate::config::{EngineConfig, MatchTuning};
use crate::text::{normalize, similarity, token_matches, token_near_match};

/// Page size for targeted searches and rankings.
pub const PAGE_SIZE: u32 = 10;
/// Upper bound on a `list_books` page.
pub const MAX_LIST_SIZE: u32 = 100;
/// `list_books` page size when no quantity was stated.
pub const DEFAULT_LIST_SIZE: u32 = 20;
/// Books from the focused book's category returned alongside it.
pub const RELATED_LIMIT: usize = 5;

// =============================================================================
// RESULT SET
// =============================================================================

/// Everything the composer may talk about. List fields are never absent,
/// only empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResultSet {
    pub books: Vec<BookItem>,
    pub total_books: u64,
    pub focused_book: Option<BookItem>,
    pub related_books: Vec<BookItem>,
    pub author_books: Vec<BookItem>,
    pub top_rated_books: Vec<BookItem>,
    pub trending_books: Vec<BookItem>,
    pub all_categories: Vec<CategoryItem>,
    pub total_authors: u64,
}

impl QueryResultSet {
    /// No data at all: every list empty and every total zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.has_books() && self.all_categories.is_empty() && self.total_books == 0 && self.total_authors == 0
    }

    /// Any book record present.
    #[must_use]
    pub fn has_books(&self) -> bool {
        self.focused_book.is_some()
            || !self.books.is_empty()
            || !self.related_books.is_empty()
            || !self.author_books.is_empty()
            || !self.top_rated_books.is_empty()
            || !self.trending_books.is_empty()
    }

    /// Whether this result carries the data `intent` asks for. A stage that
    /// answers ends the escalation chain.
    #[must_use]
    pub fn answers(&self, intent: Intent) -> bool {
        match intent {
            Intent::CountBooks => self.total_books > 0,
            Intent::CountAuthors => self.total_authors > 0,
            Intent::CountCategories | Intent::List => !self.all_categories.is_empty(),
            Intent::Greeting | Intent::Farewell | Intent::Thanks => true,
            _ => self.has_books(),
        }
    }

    /// Every distinct book title in the set, first occurrence first.
    #[must_use]
    pub fn titles(&self) -> Vec<&str> {
        let mut titles: Vec<&str> = Vec::new();
        let books = self
            .focused_book
            .iter()
            .chain(&self.books)
            .chain(&self.related_books)
            .chain(&self.author_books)
            .chain(&self.top_rated_books)
            .chain(&self.trending_books);
        for book in books {
            if !titles.contains(&book.title.as_str()) {
                titles.push(&book.title);
            }
        }
        titles
    }

    #[must_use]
    pub fn category_names(&self) -> Vec<&str> {
        self.all_categories.iter().map(|c| c.name.as_str()).collect()
    }

    /// The book a detail reply should describe: the focused book, else the
    /// best search hit.
    #[must_use]
    pub fn best_book(&self) -> Option<&BookItem> {
        self.focused_book.as_ref().or_else(|| self.books.first())
    }
}

// =============================================================================
// RESOLVE
// =============================================================================

fn logged<T>(result: Result<T, CatalogError>, op: &'static str, fallback: T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, op, "resolver: catalog read failed");
            fallback
        }
    }
}

fn filter_from(params: &SearchParams) -> BookFilter {
    BookFilter {
        title: params.title.clone().or_else(|| params.book_mentioned.clone()),
        author: params.author.clone(),
        category: params.category.clone(),
    }
}

/// Resolve `analysis` against `catalog`.
pub async fn resolve(catalog: &dyn CatalogQuery, analysis: &IntentAnalysis, config: &EngineConfig) -> QueryResultSet {
    let mut results = QueryResultSet::default();
    if analysis.intent.is_small_talk() {
        return results;
    }

    results.all_categories = logged(catalog.list_all_categories().await, "list_all_categories", Vec::new());

    match analysis.intent {
        Intent::CountBooks => {
            let filter = filter_from(&analysis.search_params);
            let page = logged(catalog.filtered_paged_search(&filter, 1, 1).await, "count_books", Page::empty());
            results.total_books = page.total;
        }
        Intent::CountAuthors => {
            results.total_authors = logged(catalog.count_authors().await, "count_authors", 0);
        }
        Intent::CountCategories | Intent::List => {}
        Intent::ListBooks => {
            let size = analysis
                .requested_count()
                .unwrap_or(DEFAULT_LIST_SIZE)
                .clamp(1, MAX_LIST_SIZE);
            let filter = filter_from(&analysis.search_params);
            let page = logged(catalog.filtered_paged_search(&filter, 1, size).await, "list_books", Page::empty());
            results.books = page.items;
            results.total_books = page.total;
        }
        _ => resolve_books(catalog, analysis, config, &mut results).await,
    }

    debug!(
        intent = %analysis.intent,
        books = results.books.len(),
        total = results.total_books,
        focused = results.focused_book.is_some(),
        "resolver: resolved"
    );
    results
}

async fn resolve_books(
    catalog: &dyn CatalogQuery,
    analysis: &IntentAnalysis,
    config: &EngineConfig,
    results: &mut QueryResultSet,
) {
    let params = &analysis.search_params;
    let filter = filter_from(params);

    if !filter.is_empty() {
        let page = logged(catalog.filtered_paged_search(&filter, 1, PAGE_SIZE).await, "search", Page::empty());
        results.books = page.items;
        results.total_books = page.total;
    }
    if analysis.has_query_flag("rating") {
        results.top_rated_books =
            logged(catalog.top_rated_paged(1, PAGE_SIZE).await, "top_rated", Page::empty()).items;
    }
    if analysis.has_query_flag("favorite") {
        results.trending_books =
            logged(catalog.most_favorited_paged(1, PAGE_SIZE).await, "most_favorited", Page::empty()).items;
    }

    let nothing_found =
        results.books.is_empty() && results.top_rated_books.is_empty() && results.trending_books.is_empty();
    if nothing_found {
        if let Some(term) = params.primary_term() {
            results.books = relaxed_retry(catalog, term, config).await;
            results.total_books = results.books.len() as u64;
        }
    }

    if let Some(title) = filter.title.as_deref() {
        rank_by_title(&mut results.books, title);
    } else if analysis.intent == Intent::Recommend {
        rank_for_recommendation(&mut results.books, analysis.has_query_flag("favorite"));
    }

    if params.author.is_some() {
        results.author_books = results.books.clone();
    }

    let focuses = matches!(analysis.intent, Intent::AskAboutBook | Intent::FollowUp | Intent::SearchBook);
    if focuses && filter.title.is_some() {
        results.focused_book = results.books.first().cloned();
    }

    if !matches!(analysis.intent, Intent::AskAboutBook | Intent::FollowUp) {
        return;
    }
    let Some(focused) = &results.focused_book else {
        return;
    };
    let Some(category) = focused.category.clone() else {
        return;
    };
    let focused_id = focused.id;
    let wanted = normalize(&category);
    // The category filter matches substrings; keep exact category names only.
    let filter = BookFilter { category: Some(category), ..BookFilter::default() };
    let page = logged(catalog.filtered_paged_search(&filter, 1, MAX_LIST_SIZE).await, "related", Page::empty());
    results.related_books = page
        .items
        .into_iter()
        .filter(|b| b.id != focused_id && b.category.as_deref().is_some_and(|c| normalize(c) == wanted))
        .take(RELATED_LIMIT)
        .collect();
}

/// Closest titles first; ties keep catalog order.
fn rank_by_title(books: &mut [BookItem], title: &str) {
    let scores: Vec<(i64, f64)> = books.iter().map(|b| (b.id, similarity(title, &b.title))).collect();
    let score_of = |id: i64| {
        scores
            .iter()
            .find_map(|(bid, s)| (*bid == id).then_some(*s))
            .unwrap_or_default()
    };
    books.sort_by(|a, b| score_of(b.id).total_cmp(&score_of(a.id)));
}

fn rank_for_recommendation(books: &mut [BookItem], by_favorites: bool) {
    if by_favorites {
        books.sort_by(|a, b| b.favorite_count.cmp(&a.favorite_count).then(a.id.cmp(&b.id)));
    } else {
        books.sort_by(|a, b| {
            b.rating
                .unwrap_or_default()
                .total_cmp(&a.rating.unwrap_or_default())
                .then(a.id.cmp(&b.id))
        });
    }
}

// =============================================================================
// RELAXED RETRY
// =============================================================================

/// Fuzzy score of `book` against `term`.
#[must_use]
pub fn score_candidate(term: &str, book: &BookItem, tuning: &MatchTuning) -> f64 {
    let fields: Vec<&str> = [Some(book.title.as_str()), book.author.as_deref(), book.synopsis.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    let mut score = fields
        .iter()
        .map(|field| similarity(term, field))
        .fold(0.0_f64, f64::max);
    if fields.iter().any(|field| token_matches(term, field)) {
        score = score.max(tuning.token_boost);
    }
    if fields.iter().any(|field| token_near_match(term, field)) {
        score = score.max(tuning.near_boost);
    }
    score
}

/// Tokens worth prefiltering on: three or more characters and not filler.
/// Falls back to every token when none qualify.
fn prefilter_tokens(term: &str) -> Vec<String> {
    let normalized = normalize(term);
    let all: Vec<&str> = normalized.split_whitespace().collect();
    let keys: Vec<&str> = all
        .iter()
        .copied()
        .filter(|t| t.chars().count() >= 3 && !FILLER.contains(t))
        .collect();
    let chosen = if keys.is_empty() { all } else { keys };
    chosen.into_iter().map(str::to_string).collect()
}

/// Token-filtered fuzzy search, broadening to a bounded sample when the
/// token filter finds nothing. Best score first, ties by id.
pub async fn relaxed_retry(catalog: &dyn CatalogQuery, term: &str, config: &EngineConfig) -> Vec<BookItem> {
    let tokens = prefilter_tokens(term);
    if tokens.is_empty() {
        return Vec::new();
    }

    let candidates = logged(
        catalog.search_any_token(&tokens, config.candidate_limit).await,
        "search_any_token",
        Vec::new(),
    );
    let (pool, keep, tier) = if candidates.is_empty() {
        let sample = logged(catalog.sample(config.sample_size).await, "sample", Vec::new());
        (sample, config.tuning.broad_keep_threshold, "sample")
    } else {
        (candidates, config.tuning.keep_threshold, "tokens")
    };

    let pool_size = pool.len();
    let mut scored: Vec<(f64, BookItem)> = pool
        .into_iter()
        .map(|book| (score_candidate(term, &book, &config.tuning), book))
        .filter(|(score, _)| *score >= keep)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.id.cmp(&b.1.id)));
    scored.truncate(PAGE_SIZE as usize);

    debug!(tier, pool = pool_size, kept = scored.len(), "resolver: relaxed retry");
    scored.into_iter().map(|(_, book)| book).collect()
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
