//! Database initialization, migration runner, and Postgres-backed stores.

pub mod catalog;
pub mod transcript;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use catalog::PgCatalog;
pub use transcript::PgTranscript;

/// Initialize the PostgreSQL connection pool and run migrations.
///
/// # Errors
///
/// Returns an error if the connection or migrations fail.
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect(database_url)
        .await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;

    Ok(pool)
}

/// `ILIKE` pattern matching `term` anywhere, with wildcards in `term` escaped.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

/// Row offset of a 1-indexed page.
pub(crate) fn page_offset(page: u32, page_size: u32) -> i64 {
    i64::from(page.max(1) - 1) * i64::from(page_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Dune"), "%Dune%");
        assert_eq!(contains_pattern(" 100% _x "), "%100\\% \\_x%");
    }

    #[test]
    fn page_offset_is_one_indexed() {
        assert_eq!(page_offset(1, 10), 0);
        assert_eq!(page_offset(0, 10), 0);
        assert_eq!(page_offset(3, 20), 40);
    }
}
