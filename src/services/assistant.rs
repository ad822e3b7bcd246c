//! Assistant — one conversational turn, end to end.
//!
//! STATE MACHINE
//! =============
//! ```text
//! RECEIVED → LOCAL_ANALYZED → LOCAL_QUERIED → [done?]
//!          → AI_ANALYZED → AI_QUERIED → [done?]
//!          → AI_NORMALIZED → AI_REQUERIED → [done?]
//!          → AI_FREEFORM → VALIDATED → DONE
//! ```
//!
//! A stage is entered only when the previous one produced no data that
//! answers the intent, and the `AI_*` stages only when a model is
//! configured. Without a model the turn ends at `LOCAL_QUERIED` with the
//! deterministic reply, the category offer, or the apology.
//!
//! CONCURRENCY
//! ===========
//! The session's context lock is held from receipt to reply, so turns of one
//! session never interleave. Catalog reads and model calls run one after
//! another; later stages depend on earlier results.

use std::sync::{Arc, Mutex, PoisonError};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::catalog::CatalogQuery;
use super::compose::{
    self, DATA_SYSTEM, FREEFORM_SYSTEM, NORMALIZE_SYSTEM, compose, data_prompt, freeform_prompt, is_grounded,
    normalize_prompt, parse_normalized_query,
};
use super::context::{ChatMessage, ChatRole, ConversationContext, SessionContexts, now_ms};
use super::extract::extract_with_llm;
use super::intent::{Intent, IntentAnalysis, IntentClassifier, SearchParams};
use super::resolver::{QueryResultSet, resolve};
use super::transcript::TranscriptStore;
use crate::config::EngineConfig;
use crate::llm::{self, LlmChat};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Received,
    LocalAnalyzed,
    LocalQueried,
    AiAnalyzed,
    AiQueried,
    AiNormalized,
    AiRequeried,
    AiFreeform,
    Validated,
    Done,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "RECEIVED",
            Self::LocalAnalyzed => "LOCAL_ANALYZED",
            Self::LocalQueried => "LOCAL_QUERIED",
            Self::AiAnalyzed => "AI_ANALYZED",
            Self::AiQueried => "AI_QUERIED",
            Self::AiNormalized => "AI_NORMALIZED",
            Self::AiRequeried => "AI_REQUERIED",
            Self::AiFreeform => "AI_FREEFORM",
            Self::Validated => "VALIDATED",
            Self::Done => "DONE",
        }
    }
}

/// Result of one turn: the reply and the stage that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnOutcome {
    pub reply: String,
    pub stage: Stage,
    pub intent: Intent,
}

impl TurnOutcome {
    fn new(reply: impl Into<String>, stage: Stage, intent: Intent) -> Self {
        Self { reply: reply.into(), stage, intent }
    }
}

/// Intents whose search terms a model can repair.
fn retargetable(intent: Intent) -> bool {
    matches!(
        intent,
        Intent::SearchBook | Intent::AskAboutBook | Intent::FollowUp | Intent::Recommend | Intent::GeneralChat
    )
}

fn retarget(analysis: &IntentAnalysis, params: SearchParams, explanation: &str) -> IntentAnalysis {
    let intent = if analysis.intent == Intent::GeneralChat { Intent::SearchBook } else { analysis.intent };
    IntentAnalysis {
        intent,
        query_type: analysis.query_type.clone(),
        search_params: params,
        context_reference: None,
        explanation: explanation.to_string(),
    }
}

fn log_stage(session_id: &str, stage: Stage, analysis: &IntentAnalysis) {
    debug!(
        session_id,
        stage = stage.as_str(),
        intent = %analysis.intent,
        query_type = %analysis.query_type,
        explanation = %analysis.explanation,
        "assistant: stage"
    );
}

// =============================================================================
// ASSISTANT
// =============================================================================

/// The conversational query engine behind `receive_message`.
pub struct Assistant {
    catalog: Arc<dyn CatalogQuery>,
    transcripts: Arc<dyn TranscriptStore>,
    llm: Option<Arc<dyn LlmChat>>,
    contexts: SessionContexts,
    rng: Mutex<StdRng>,
    config: EngineConfig,
}

impl Assistant {
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogQuery>,
        transcripts: Arc<dyn TranscriptStore>,
        llm: Option<Arc<dyn LlmChat>>,
        config: EngineConfig,
    ) -> Self {
        let rng = config
            .rng_seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            catalog,
            transcripts,
            llm,
            contexts: SessionContexts::new(config.history_limit),
            rng: Mutex::new(rng),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    #[must_use]
    pub fn transcripts(&self) -> &dyn TranscriptStore {
        self.transcripts.as_ref()
    }

    #[must_use]
    pub fn contexts(&self) -> &SessionContexts {
        &self.contexts
    }

    /// Handle one user message and return the reply text. Never fails.
    pub async fn receive_message(&self, session_id: &str, text: &str) -> String {
        self.handle_turn(session_id, text).await.reply
    }

    /// [`Assistant::receive_message`] with the producing stage and intent.
    pub async fn handle_turn(&self, session_id: &str, text: &str) -> TurnOutcome {
        let session = self.contexts.session(session_id).await;
        let mut ctx = session.lock().await;
        self.hydrate(&mut ctx).await;

        debug!(session_id, stage = Stage::Received.as_str(), "assistant: stage");
        self.record(&mut ctx, ChatRole::User, text).await;

        let outcome = self.run(&ctx, text).await;

        self.record(&mut ctx, ChatRole::Assistant, &outcome.reply).await;
        if outcome.intent == Intent::Farewell {
            ctx.clear();
        }
        info!(
            session_id,
            intent = %outcome.intent,
            stage = outcome.stage.as_str(),
            "assistant: {}",
            Stage::Done.as_str()
        );
        outcome
    }

    /// Seed a fresh context from the transcript store, once per process.
    async fn hydrate(&self, ctx: &mut ConversationContext) {
        if ctx.is_hydrated() {
            return;
        }
        ctx.mark_hydrated();
        let history = self.transcripts.history(ctx.session_id()).await;
        match history {
            Ok(entries) => {
                let skip = entries.len().saturating_sub(self.config.history_limit);
                let restored = entries.len() - skip;
                for entry in entries.into_iter().skip(skip) {
                    ctx.push(ChatMessage::new(entry.role, entry.content, entry.timestamp));
                }
                if restored > 0 {
                    debug!(session_id = ctx.session_id(), restored, "assistant: context hydrated");
                }
            }
            Err(e) => warn!(error = %e, session_id = ctx.session_id(), "assistant: transcript history failed"),
        }
    }

    /// Append to the context and the transcript. A transcript failure is
    /// logged; the turn carries on.
    async fn record(&self, ctx: &mut ConversationContext, role: ChatRole, text: &str) {
        let message = ChatMessage::new(role, text, now_ms());
        if let Err(e) = self
            .transcripts
            .append(ctx.session_id(), role, text, message.timestamp())
            .await
        {
            warn!(error = %e, session_id = ctx.session_id(), role = role.as_str(), "assistant: transcript append failed");
        }
        ctx.push(message);
    }

    fn canned(&self, intent: Intent) -> Option<&'static str> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        compose::small_talk_reply(intent, &mut *rng)
    }

    async fn classifier(&self) -> IntentClassifier {
        let categories: Vec<String> = match self.catalog.list_all_categories().await {
            Ok(categories) => categories.into_iter().map(|c| c.name).collect(),
            Err(e) => {
                warn!(error = %e, "assistant: category list unavailable for classification");
                Vec::new()
            }
        };
        IntentClassifier::new(categories, &self.config.tuning)
    }

    async fn run(&self, ctx: &ConversationContext, text: &str) -> TurnOutcome {
        let session_id = ctx.session_id();

        // LOCAL_ANALYZED
        let analysis = self.classifier().await.analyze(text, ctx);
        log_stage(session_id, Stage::LocalAnalyzed, &analysis);
        if let Some(reply) = self.canned(analysis.intent) {
            return TurnOutcome::new(reply, Stage::LocalAnalyzed, analysis.intent);
        }

        // LOCAL_QUERIED
        let results = resolve(self.catalog.as_ref(), &analysis, &self.config).await;
        log_stage(session_id, Stage::LocalQueried, &analysis);
        if results.answers(analysis.intent) {
            return TurnOutcome::new(compose(&analysis, &results), Stage::LocalQueried, analysis.intent);
        }
        let Some(llm) = self.llm.as_deref() else {
            return TurnOutcome::new(compose(&analysis, &results), Stage::LocalQueried, analysis.intent);
        };

        let history = ctx.formatted_history(self.config.prompt_history);
        if retargetable(analysis.intent) {
            if let Some(outcome) = self.model_retries(llm, session_id, text, &history, &analysis).await {
                return outcome;
            }
        }

        self.freeform(llm, session_id, text, &history, &analysis, &results).await
    }

    /// AI_ANALYZED → AI_QUERIED, then AI_NORMALIZED → AI_REQUERIED.
    async fn model_retries(
        &self,
        llm: &dyn LlmChat,
        session_id: &str,
        text: &str,
        history: &str,
        analysis: &IntentAnalysis,
    ) -> Option<TurnOutcome> {
        let (max_tokens, deadline) = (self.config.max_tokens, self.config.llm_timeout);

        if let Some(params) = extract_with_llm(llm, text, history, max_tokens, deadline).await {
            if params != analysis.search_params {
                let extracted = retarget(analysis, params, "model-assisted extraction");
                log_stage(session_id, Stage::AiAnalyzed, &extracted);
                let results = resolve(self.catalog.as_ref(), &extracted, &self.config).await;
                log_stage(session_id, Stage::AiQueried, &extracted);
                if results.answers(extracted.intent) {
                    return Some(TurnOutcome::new(compose(&extracted, &results), Stage::AiQueried, extracted.intent));
                }
            }
        }

        let reply = llm::complete(llm, NORMALIZE_SYSTEM, &normalize_prompt(text, history), max_tokens, deadline).await;
        let query = parse_normalized_query(&reply)?;
        let params = SearchParams { title: Some(query), ..SearchParams::default() };
        let normalized = retarget(analysis, params, "model-normalized query");
        log_stage(session_id, Stage::AiNormalized, &normalized);
        let results = resolve(self.catalog.as_ref(), &normalized, &self.config).await;
        log_stage(session_id, Stage::AiRequeried, &normalized);
        results
            .answers(normalized.intent)
            .then(|| TurnOutcome::new(compose(&normalized, &results), Stage::AiRequeried, normalized.intent))
    }

    /// AI_FREEFORM → VALIDATED. A model reply that names nothing from a
    /// non-empty result set is replaced by the deterministic reply.
    async fn freeform(
        &self,
        llm: &dyn LlmChat,
        session_id: &str,
        text: &str,
        history: &str,
        analysis: &IntentAnalysis,
        results: &QueryResultSet,
    ) -> TurnOutcome {
        let (system, prompt) = if results.is_empty() {
            (FREEFORM_SYSTEM, freeform_prompt(text, history))
        } else {
            (DATA_SYSTEM, data_prompt(text, history, results))
        };
        let reply = llm::complete(llm, system, &prompt, self.config.max_tokens, self.config.llm_timeout).await;
        log_stage(session_id, Stage::AiFreeform, analysis);

        let reply = if reply.is_empty() {
            compose(analysis, results)
        } else if !results.is_empty() && !is_grounded(&reply, results) {
            warn!(session_id, "assistant: discarding ungrounded model reply");
            compose(analysis, results)
        } else {
            reply
        };
        log_stage(session_id, Stage::Validated, analysis);
        TurnOutcome::new(reply, Stage::Validated, analysis.intent)
    }
}

#[cfg(test)]
#[path = "assistant_test.rs"]
mod tests;
