//! Transcript store — durable per-session message log.
//!
//! The assistant appends both sides of every turn and reads a session's
//! history back when a context is first created in this process. Storage is
//! external: `db::transcript::PgTranscript` in production,
//! `InMemoryTranscript` for tests and seed-file mode.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::context::ChatRole;

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("unknown role: {0}")]
    UnknownRole(String),
}

/// One persisted transcript line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: ChatRole,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

#[async_trait::async_trait]
pub trait TranscriptStore: Send + Sync {
    async fn append(&self, session_id: &str, role: ChatRole, text: &str, timestamp: i64)
    -> Result<(), TranscriptError>;

    /// Every message of the session, oldest first.
    async fn history(&self, session_id: &str) -> Result<Vec<TranscriptEntry>, TranscriptError>;
}

/// Transcript kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryTranscript {
    sessions: RwLock<HashMap<String, Vec<TranscriptEntry>>>,
}

impl InMemoryTranscript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl TranscriptStore for InMemoryTranscript {
    async fn append(
        &self,
        session_id: &str,
        role: ChatRole,
        text: &str,
        timestamp: i64,
    ) -> Result<(), TranscriptError> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_default()
            .push(TranscriptEntry { role, content: text.to_string(), timestamp });
        Ok(())
    }

    async fn history(&self, session_id: &str) -> Result<Vec<TranscriptEntry>, TranscriptError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned().unwrap_or_default())
    }
}
