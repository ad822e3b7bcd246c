//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the one `Assistant`, which owns the catalog and transcript handles,
//! the optional LLM client, and the per-session contexts.

use std::sync::Arc;

use crate::services::assistant::Assistant;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; the assistant is Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
}

impl AppState {
    #[must_use]
    pub fn new(assistant: Assistant) -> Self {
        Self { assistant: Arc::new(assistant) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::config::EngineConfig;
    use crate::llm::LlmChat;
    use crate::llm::types::{ChatResponse, LlmError, Message};
    use crate::services::catalog::{BookItem, InMemoryCatalog};
    use crate::services::transcript::InMemoryTranscript;

    fn book(id: i64, title: &str, author: &str, category: &str, rating: Option<f64>, favorite_count: i64) -> BookItem {
        BookItem {
            id,
            title: title.into(),
            author: Some(author.into()),
            category: Some(category.into()),
            rating,
            favorite_count,
            synopsis: None,
        }
    }

    /// Six books across five categories; Dune is unrated and unfavorited.
    #[must_use]
    pub fn seed_books() -> Vec<BookItem> {
        let mut harry = book(1, "Harry Potter and the Philosopher's Stone", "J.K. Rowling", "Fantasy", Some(4.8), 120);
        harry.synopsis = Some("Cậu bé phù thủy Harry bước vào trường Hogwarts.".into());
        let mut dune = book(6, "Dune", "Frank Herbert", "Khoa học viễn tưởng", None, 0);
        dune.synopsis = Some("Paul Atreides đến hành tinh sa mạc Arrakis.".into());
        vec![
            harry,
            book(2, "Mắt Biếc", "Nguyễn Nhật Ánh", "Tiểu thuyết", Some(4.6), 90),
            book(3, "Đắc Nhân Tâm", "Dale Carnegie", "Kỹ năng sống", Some(4.5), 150),
            book(4, "Cho Tôi Xin Một Vé Đi Tuổi Thơ", "Nguyễn Nhật Ánh", "Tiểu thuyết", Some(4.4), 60),
            book(5, "Sherlock Holmes: A Study in Scarlet", "Arthur Conan Doyle", "Trinh thám", Some(4.3), 30),
            dune,
        ]
    }

    /// [`seed_books`] plus an empty "Lịch sử" category.
    #[must_use]
    pub fn seed_catalog() -> InMemoryCatalog {
        InMemoryCatalog::with_categories(seed_books(), vec!["Lịch sử".into()])
    }

    /// Engine config with a fixed RNG seed and a short model deadline.
    #[must_use]
    pub fn test_config() -> EngineConfig {
        EngineConfig { rng_seed: Some(42), llm_timeout: Duration::from_secs(5), ..EngineConfig::default() }
    }

    /// Assistant over `catalog` with an in-memory transcript.
    #[must_use]
    pub fn test_assistant(catalog: InMemoryCatalog, llm: Option<Arc<dyn LlmChat>>) -> Assistant {
        Assistant::new(Arc::new(catalog), Arc::new(InMemoryTranscript::new()), llm, test_config())
    }

    /// Create a test `AppState` over the seed catalog, without a model.
    #[must_use]
    pub fn test_app_state() -> AppState {
        AppState::new(test_assistant(seed_catalog(), None))
    }

    /// LLM stub replaying scripted replies in order. Once the script runs
    /// out every call fails, which callers see as "no assisted result".
    pub struct MockLlm {
        replies: Mutex<VecDeque<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl MockLlm {
        #[must_use]
        pub fn new<I, S>(replies: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        /// Every user prompt received so far.
        #[must_use]
        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }

        #[must_use]
        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl LlmChat for MockLlm {
        async fn chat(&self, _max_tokens: u32, _system: &str, messages: &[Message]) -> Result<ChatResponse, LlmError> {
            let prompt = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            self.prompts.lock().unwrap().push(prompt);
            let reply = self.replies.lock().unwrap().pop_front();
            match reply {
                Some(text) => Ok(ChatResponse {
                    text,
                    model: "mock".into(),
                    stop_reason: "end_turn".into(),
                    input_tokens: 0,
                    output_tokens: 0,
                }),
                None => Err(LlmError::ApiResponse { status: 503, body: "script exhausted".into() }),
            }
        }
    }
}
