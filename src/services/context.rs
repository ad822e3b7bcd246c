//! Conversation context — bounded, ordered per-session message history.
//!
//! DESIGN
//! ======
//! `SessionContexts` maps a session id to its own
//! `Arc<tokio::sync::Mutex<ConversationContext>>`. A turn holds that lock
//! from receipt to reply, so turns of one session are serialized and the
//! history stays chronological. Sessions never share a lock or a buffer.

use std::collections::{HashMap, VecDeque};
use std::fmt::Write;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use super::transcript::TranscriptError;

/// Placeholder returned by [`ConversationContext::formatted_history`] for an empty context.
pub const EMPTY_HISTORY: &str = "(no previous messages)";

/// Current time as milliseconds since Unix epoch.
pub(crate) fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

// =============================================================================
// CHAT MESSAGE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for ChatRole {
    type Err = TranscriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(TranscriptError::UnknownRole(other.to_string())),
        }
    }
}

/// One immutable turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    role: ChatRole,
    content: String,
    timestamp: i64,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: ChatRole, content: impl Into<String>, timestamp: i64) -> Self {
        Self { role, content: content.into(), timestamp }
    }

    #[must_use]
    pub fn role(&self) -> ChatRole {
        self.role
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Milliseconds since the Unix epoch.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

// =============================================================================
// CONVERSATION CONTEXT
// =============================================================================

/// Ordered history of one session, capped at `limit` messages (oldest evicted first).
#[derive(Debug, Clone)]
pub struct ConversationContext {
    session_id: String,
    messages: VecDeque<ChatMessage>,
    limit: usize,
    hydrated: bool,
}

impl ConversationContext {
    #[must_use]
    pub fn new(session_id: impl Into<String>, limit: usize) -> Self {
        let limit = limit.max(1);
        Self { session_id: session_id.into(), messages: VecDeque::with_capacity(limit), limit, hydrated: false }
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Append a message stamped with the current time.
    pub fn add_message(&mut self, role: ChatRole, content: impl Into<String>) {
        self.push(ChatMessage::new(role, content, now_ms()));
    }

    /// Append an existing message, evicting the oldest beyond the limit.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push_back(message);
        while self.messages.len() > self.limit {
            self.messages.pop_front();
        }
    }

    /// The last `n` messages as `role: content` lines, oldest first.
    #[must_use]
    pub fn formatted_history(&self, n: usize) -> String {
        if self.messages.is_empty() || n == 0 {
            return EMPTY_HISTORY.to_string();
        }
        let skip = self.messages.len().saturating_sub(n);
        let mut out = String::new();
        for message in self.messages.iter().skip(skip) {
            let _ = writeln!(out, "{}: {}", message.role.as_str(), message.content);
        }
        out.trim_end().to_string()
    }

    #[must_use]
    pub fn last_assistant_message(&self) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::Assistant)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// `true` once the context has been seeded from the transcript store.
    #[must_use]
    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    pub fn mark_hydrated(&mut self) {
        self.hydrated = true;
    }
}

// =============================================================================
// SESSION CONTEXTS
// =============================================================================

/// Session-keyed store of conversation contexts, created lazily.
///
/// Callers must hold the returned mutex for the whole turn; that is the
/// serialization point for a session.
#[derive(Clone)]
pub struct SessionContexts {
    inner: Arc<RwLock<HashMap<String, Arc<Mutex<ConversationContext>>>>>,
    limit: usize,
}

impl SessionContexts {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())), limit }
    }

    /// The context for `session_id`, creating an empty one on first use.
    pub async fn session(&self, session_id: &str) -> Arc<Mutex<ConversationContext>> {
        if let Some(ctx) = self.inner.read().await.get(session_id) {
            return Arc::clone(ctx);
        }
        let mut map = self.inner.write().await;
        Arc::clone(
            map.entry(session_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(ConversationContext::new(session_id, self.limit)))),
        )
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
