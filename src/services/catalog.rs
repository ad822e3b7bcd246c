//! Catalog query service — read-only view of the book catalog.
//!
//! DESIGN
//! ======
//! The assistant never owns catalog storage. `CatalogQuery` is the read
//! contract it consumes; `db::catalog::PgCatalog` implements it over
//! Postgres and `InMemoryCatalog` over a JSON seed (tests, offline demos).
//! Pagination is 1-indexed everywhere.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::text::normalize;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("seed file error: {0}")]
    Seed(String),
}

/// A catalog record as the assistant sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookItem {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub favorite_count: i64,
    #[serde(default)]
    pub synopsis: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryItem {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub book_count: i64,
}

/// One page of results plus the unpaged total.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn empty() -> Self {
        Self { items: Vec::new(), total: 0 }
    }
}

/// Field filters for [`CatalogQuery::filtered_paged_search`]. Matching is
/// substring, case- and accent-insensitive; unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
}

impl BookFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.category.is_none()
    }
}

// =============================================================================
// CATALOG QUERY TRAIT
// =============================================================================

/// Read operations the assistant needs from the catalog.
#[async_trait::async_trait]
pub trait CatalogQuery: Send + Sync {
    async fn filtered_paged_search(
        &self,
        filter: &BookFilter,
        page: u32,
        page_size: u32,
    ) -> Result<Page<BookItem>, CatalogError>;

    /// Rated books, best first.
    async fn top_rated_paged(&self, page: u32, page_size: u32) -> Result<Page<BookItem>, CatalogError>;

    /// Books with at least one favorite, most favorited first.
    async fn most_favorited_paged(&self, page: u32, page_size: u32) -> Result<Page<BookItem>, CatalogError>;

    async fn list_all_categories(&self) -> Result<Vec<CategoryItem>, CatalogError>;

    /// Books whose title, author, or synopsis contains any of `tokens`
    /// (normalized), capped at `limit`.
    async fn search_any_token(&self, tokens: &[String], limit: u32) -> Result<Vec<BookItem>, CatalogError>;

    /// The first `limit` books in id order.
    async fn sample(&self, limit: u32) -> Result<Vec<BookItem>, CatalogError>;

    /// Number of distinct authors.
    async fn count_authors(&self) -> Result<u64, CatalogError>;
}

// =============================================================================
// IN-MEMORY CATALOG
// =============================================================================

/// Seed file layout for [`InMemoryCatalog::from_json_file`].
#[derive(Debug, Default, Deserialize)]
struct CatalogSeed {
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    books: Vec<BookItem>,
}

/// Catalog held entirely in memory, ordered by book id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    books: Vec<BookItem>,
    categories: Vec<String>,
}

impl InMemoryCatalog {
    /// Build a catalog from books; categories are collected from the books.
    #[must_use]
    pub fn new(books: Vec<BookItem>) -> Self {
        Self::with_categories(books, Vec::new())
    }

    /// Build a catalog with extra categories that may have no books yet.
    #[must_use]
    pub fn with_categories(mut books: Vec<BookItem>, extra: Vec<String>) -> Self {
        books.sort_by_key(|b| b.id);
        let mut names: BTreeSet<String> = extra.into_iter().collect();
        names.extend(books.iter().filter_map(|b| b.category.clone()));
        Self { books, categories: names.into_iter().collect() }
    }

    /// Load a catalog from a JSON seed file (`{"categories": [...], "books": [...]}`).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Seed`] if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path).map_err(|e| CatalogError::Seed(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::Seed`] if `raw` is not a valid seed document.
    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let seed: CatalogSeed = serde_json::from_str(raw).map_err(|e| CatalogError::Seed(e.to_string()))?;
        Ok(Self::with_categories(seed.books, seed.categories))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.books.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

fn field_contains(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|f| normalize(f).contains(needle))
}

fn matches_filter(book: &BookItem, filter: &BookFilter) -> bool {
    let check = |wanted: &Option<String>, field: Option<&str>| {
        wanted
            .as_deref()
            .map_or(true, |w| field_contains(field, &normalize(w)))
    };
    check(&filter.title, Some(&book.title))
        && check(&filter.author, book.author.as_deref())
        && check(&filter.category, book.category.as_deref())
}

fn paginate(items: Vec<BookItem>, page: u32, page_size: u32) -> Page<BookItem> {
    let total = items.len() as u64;
    let skip = (page.max(1) as usize - 1).saturating_mul(page_size as usize);
    let items = items
        .into_iter()
        .skip(skip)
        .take(page_size as usize)
        .collect();
    Page { items, total }
}

#[async_trait::async_trait]
impl CatalogQuery for InMemoryCatalog {
    async fn filtered_paged_search(
        &self,
        filter: &BookFilter,
        page: u32,
        page_size: u32,
    ) -> Result<Page<BookItem>, CatalogError> {
        let hits = self
            .books
            .iter()
            .filter(|b| matches_filter(b, filter))
            .cloned()
            .collect();
        Ok(paginate(hits, page, page_size))
    }

    async fn top_rated_paged(&self, page: u32, page_size: u32) -> Result<Page<BookItem>, CatalogError> {
        let mut rated: Vec<BookItem> = self
            .books
            .iter()
            .filter(|b| b.rating.is_some())
            .cloned()
            .collect();
        rated.sort_by(|a, b| {
            b.rating
                .unwrap_or_default()
                .total_cmp(&a.rating.unwrap_or_default())
                .then(a.id.cmp(&b.id))
        });
        Ok(paginate(rated, page, page_size))
    }

    async fn most_favorited_paged(&self, page: u32, page_size: u32) -> Result<Page<BookItem>, CatalogError> {
        let mut favored: Vec<BookItem> = self
            .books
            .iter()
            .filter(|b| b.favorite_count > 0)
            .cloned()
            .collect();
        favored.sort_by(|a, b| b.favorite_count.cmp(&a.favorite_count).then(a.id.cmp(&b.id)));
        Ok(paginate(favored, page, page_size))
    }

    async fn list_all_categories(&self) -> Result<Vec<CategoryItem>, CatalogError> {
        Ok(self
            .categories
            .iter()
            .zip(1_i64..)
            .map(|(name, id)| CategoryItem {
                id,
                name: name.clone(),
                book_count: self
                    .books
                    .iter()
                    .filter(|b| b.category.as_deref() == Some(name.as_str()))
                    .count() as i64,
            })
            .collect())
    }

    async fn search_any_token(&self, tokens: &[String], limit: u32) -> Result<Vec<BookItem>, CatalogError> {
        let tokens: Vec<String> = tokens
            .iter()
            .map(|t| normalize(t))
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .books
            .iter()
            .filter(|b| {
                tokens.iter().any(|t| {
                    field_contains(Some(&b.title), t)
                        || field_contains(b.author.as_deref(), t)
                        || field_contains(b.synopsis.as_deref(), t)
                })
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn sample(&self, limit: u32) -> Result<Vec<BookItem>, CatalogError> {
        Ok(self.books.iter().take(limit as usize).cloned().collect())
    }

    async fn count_authors(&self) -> Result<u64, CatalogError> {
        let authors: BTreeSet<String> = self
            .books
            .iter()
            .filter_map(|b| b.author.as_deref().map(normalize))
            .filter(|a| !a.is_empty())
            .collect();
        Ok(authors.len() as u64)
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
