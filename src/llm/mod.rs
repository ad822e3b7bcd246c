//! LLM — optional generative-text collaborator.
//!
//! DESIGN
//! ======
//! The assistant only needs `complete(prompt) -> text`. `LlmClient` dispatches
//! to Anthropic or an OpenAI-compatible endpoint based on `LLM_PROVIDER`;
//! [`complete`] wraps any [`LlmChat`] with a hard deadline and folds every
//! failure into an empty string so callers fall back to heuristics.

pub mod anthropic;
pub mod config;
pub mod openai;
pub mod types;

use std::time::Duration;

use tracing::{debug, warn};

use config::{LlmConfig, LlmProviderKind};
pub use types::LlmChat;
use types::{ChatResponse, LlmError, Message};

// =============================================================================
// CLIENT DISPATCH
// =============================================================================

/// Concrete LLM client that dispatches to either Anthropic or `OpenAI`.
///
/// Configured from environment variables by [`LlmClient::from_env`].
pub struct LlmClient {
    inner: LlmProvider,
    model: String,
}

enum LlmProvider {
    Anthropic(anthropic::AnthropicClient),
    OpenAi(openai::OpenAiClient),
}

impl LlmClient {
    /// Build an LLM client from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the HTTP client fails.
    pub fn from_env() -> Result<Self, LlmError> {
        let config = LlmConfig::from_env()?;
        Self::from_config(config)
    }

    /// Build an LLM client from a parsed typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider HTTP client fails to build.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let model = config.model.clone();
        let inner = match config.provider {
            LlmProviderKind::Anthropic => {
                LlmProvider::Anthropic(anthropic::AnthropicClient::new(config.api_key, config.timeouts)?)
            }
            LlmProviderKind::OpenAi => LlmProvider::OpenAi(openai::OpenAiClient::new(
                config.api_key,
                config.openai_base_url,
                config.timeouts,
            )?),
        };
        Ok(Self { inner, model })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl LlmChat for LlmClient {
    async fn chat(&self, max_tokens: u32, system: &str, messages: &[Message]) -> Result<ChatResponse, LlmError> {
        match &self.inner {
            LlmProvider::Anthropic(c) => c.chat(&self.model, max_tokens, system, messages).await,
            LlmProvider::OpenAi(c) => c.chat(&self.model, max_tokens, system, messages).await,
        }
    }
}

// =============================================================================
// SOFT COMPLETION
// =============================================================================

/// Single-prompt completion that never fails.
///
/// Timeout, transport errors, non-success statuses, and malformed payloads
/// all yield an empty string.
pub async fn complete(llm: &dyn LlmChat, system: &str, prompt: &str, max_tokens: u32, deadline: Duration) -> String {
    let messages = [Message::user(prompt)];
    match tokio::time::timeout(deadline, llm.chat(max_tokens, system, &messages)).await {
        Ok(Ok(response)) => {
            debug!(
                model = %response.model,
                input_tokens = response.input_tokens,
                output_tokens = response.output_tokens,
                "llm: completion ok"
            );
            response.text.trim().to_string()
        }
        Ok(Err(e)) => {
            warn!(error = %e, retryable = e.retryable(), "llm: completion failed");
            String::new()
        }
        Err(_) => {
            warn!(timeout_secs = deadline.as_secs(), "llm: completion timed out");
            String::new()
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
