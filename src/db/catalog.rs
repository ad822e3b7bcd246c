//! Postgres implementation of [`CatalogQuery`].
//!
//! Text filters compare `unaccent(column)` against `unaccent(pattern)` with
//! `ILIKE`, so matching is case- and accent-insensitive like the in-memory
//! catalog.

use sqlx::PgPool;

use super::{contains_pattern, page_offset};
use crate::services::catalog::{BookFilter, BookItem, CatalogError, CatalogQuery, CategoryItem, Page};

type BookRow = (i64, String, Option<String>, Option<String>, Option<f64>, i64, Option<String>);

const BOOK_COLUMNS: &str = "SELECT b.id, b.title, b.author, c.name, b.rating, b.favorite_count, b.synopsis \
     FROM books b LEFT JOIN categories c ON c.id = b.category_id";

const FILTER_WHERE: &str = "WHERE ($1::text IS NULL OR unaccent(b.title) ILIKE unaccent($1)) \
     AND ($2::text IS NULL OR unaccent(b.author) ILIKE unaccent($2)) \
     AND ($3::text IS NULL OR unaccent(c.name) ILIKE unaccent($3))";

fn to_item((id, title, author, category, rating, favorite_count, synopsis): BookRow) -> BookItem {
    BookItem { id, title, author, category, rating, favorite_count, synopsis }
}

fn to_total(count: i64) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

/// Read-only catalog over the `books` and `categories` tables.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CatalogQuery for PgCatalog {
    async fn filtered_paged_search(
        &self,
        filter: &BookFilter,
        page: u32,
        page_size: u32,
    ) -> Result<Page<BookItem>, CatalogError> {
        let title = filter.title.as_deref().map(contains_pattern);
        let author = filter.author.as_deref().map(contains_pattern);
        let category = filter.category.as_deref().map(contains_pattern);

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM books b LEFT JOIN categories c ON c.id = b.category_id {FILTER_WHERE}"
        ))
        .bind(&title)
        .bind(&author)
        .bind(&category)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, BookRow>(&format!("{BOOK_COLUMNS} {FILTER_WHERE} ORDER BY b.id LIMIT $4 OFFSET $5"))
            .bind(&title)
            .bind(&author)
            .bind(&category)
            .bind(i64::from(page_size))
            .bind(page_offset(page, page_size))
            .fetch_all(&self.pool)
            .await?;

        Ok(Page { items: rows.into_iter().map(to_item).collect(), total: to_total(total) })
    }

    async fn top_rated_paged(&self, page: u32, page_size: u32) -> Result<Page<BookItem>, CatalogError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE rating IS NOT NULL")
            .fetch_one(&self.pool)
            .await?;
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            "{BOOK_COLUMNS} WHERE b.rating IS NOT NULL ORDER BY b.rating DESC, b.id LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(page_size))
        .bind(page_offset(page, page_size))
        .fetch_all(&self.pool)
        .await?;
        Ok(Page { items: rows.into_iter().map(to_item).collect(), total: to_total(total) })
    }

    async fn most_favorited_paged(&self, page: u32, page_size: u32) -> Result<Page<BookItem>, CatalogError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE favorite_count > 0")
            .fetch_one(&self.pool)
            .await?;
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            "{BOOK_COLUMNS} WHERE b.favorite_count > 0 ORDER BY b.favorite_count DESC, b.id LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(page_size))
        .bind(page_offset(page, page_size))
        .fetch_all(&self.pool)
        .await?;
        Ok(Page { items: rows.into_iter().map(to_item).collect(), total: to_total(total) })
    }

    async fn list_all_categories(&self) -> Result<Vec<CategoryItem>, CatalogError> {
        let rows = sqlx::query_as::<_, (i64, String, i64)>(
            "SELECT c.id, c.name, COUNT(b.id)
             FROM categories c
             LEFT JOIN books b ON b.category_id = c.id
             GROUP BY c.id, c.name
             ORDER BY c.name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name, book_count)| CategoryItem { id, name, book_count })
            .collect())
    }

    async fn search_any_token(&self, tokens: &[String], limit: u32) -> Result<Vec<BookItem>, CatalogError> {
        let patterns: Vec<String> = tokens
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| contains_pattern(t))
            .collect();
        if patterns.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            "{BOOK_COLUMNS}
             WHERE unaccent(b.title) ILIKE ANY($1)
                OR unaccent(coalesce(b.author, '')) ILIKE ANY($1)
                OR unaccent(coalesce(b.synopsis, '')) ILIKE ANY($1)
             ORDER BY b.id
             LIMIT $2"
        ))
        .bind(&patterns)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(to_item).collect())
    }

    async fn sample(&self, limit: u32) -> Result<Vec<BookItem>, CatalogError> {
        let rows = sqlx::query_as::<_, BookRow>(&format!("{BOOK_COLUMNS} ORDER BY b.id LIMIT $1"))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(to_item).collect())
    }

    async fn count_authors(&self) -> Result<u64, CatalogError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT lower(unaccent(trim(author))))
             FROM books
             WHERE author IS NOT NULL AND trim(author) <> ''",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(to_total(count))
    }
}
