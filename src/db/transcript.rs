//! Postgres implementation of [`TranscriptStore`] over `chat_messages`.

use sqlx::PgPool;

use crate::services::context::ChatRole;
use crate::services::transcript::{TranscriptEntry, TranscriptError, TranscriptStore};

/// Durable per-session chat transcript.
#[derive(Clone)]
pub struct PgTranscript {
    pool: PgPool,
}

impl PgTranscript {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TranscriptStore for PgTranscript {
    async fn append(
        &self,
        session_id: &str,
        role: ChatRole,
        text: &str,
        timestamp: i64,
    ) -> Result<(), TranscriptError> {
        sqlx::query("INSERT INTO chat_messages (session_id, role, content, created_at_ms) VALUES ($1, $2, $3, $4)")
            .bind(session_id)
            .bind(role.as_str())
            .bind(text)
            .bind(timestamp)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn history(&self, session_id: &str) -> Result<Vec<TranscriptEntry>, TranscriptError> {
        let rows = sqlx::query_as::<_, (String, String, i64)>(
            "SELECT role, content, created_at_ms
             FROM chat_messages
             WHERE session_id = $1
             ORDER BY id",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(role, content, timestamp)| Ok(TranscriptEntry { role: role.parse()?, content, timestamp }))
            .collect()
    }
}
