//! Engine configuration parsed from environment variables.
//!
//! The match thresholds are heuristic tuning values, not contractual ones;
//! they live here so deployments can adjust them against real query logs.

use std::time::Duration;

pub const DEFAULT_HISTORY_LIMIT: usize = 20;
pub const DEFAULT_PROMPT_HISTORY: usize = 6;
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_CANDIDATE_LIMIT: u32 = 100;
pub const DEFAULT_SAMPLE_SIZE: u32 = 200;

/// Parse `key` from the environment, or `default` when unset or unparsable.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Score thresholds used by the relaxed catalog retry and follow-up detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchTuning {
    /// Minimum score kept from the token-filtered candidate set.
    pub keep_threshold: f64,
    /// Minimum score kept from the broadened catalog sample.
    pub broad_keep_threshold: f64,
    /// Floor applied when any field passes `token_matches`.
    pub token_boost: f64,
    /// Score assigned when any field passes `token_near_match`.
    pub near_boost: f64,
    /// Plain similarity above which a reply counts as naming a listed title.
    pub follow_up_similarity: f64,
}

impl Default for MatchTuning {
    fn default() -> Self {
        Self {
            keep_threshold: 0.55,
            broad_keep_threshold: 0.45,
            token_boost: 0.8,
            near_boost: 0.95,
            follow_up_similarity: 0.7,
        }
    }
}

/// Tunables for one assistant instance.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Maximum messages retained per conversation context.
    pub history_limit: usize,
    /// Messages of history embedded in model prompts.
    pub prompt_history: usize,
    /// Hard deadline for a single generative-model call.
    pub llm_timeout: Duration,
    pub max_tokens: u32,
    /// Upper bound on token-filtered candidates scored by the relaxed retry.
    pub candidate_limit: u32,
    /// Size of the unfiltered catalog sample scanned as a last resort.
    pub sample_size: u32,
    /// Seed for canned-reply selection; `None` seeds from the OS.
    pub rng_seed: Option<u64>,
    pub tuning: MatchTuning,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            prompt_history: DEFAULT_PROMPT_HISTORY,
            llm_timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
            max_tokens: DEFAULT_MAX_TOKENS,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            sample_size: DEFAULT_SAMPLE_SIZE,
            rng_seed: None,
            tuning: MatchTuning::default(),
        }
    }
}

impl EngineConfig {
    /// Build the engine config from `ASSISTANT_*` environment variables.
    ///
    /// Unset or unparsable values fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = MatchTuning::default();
        Self {
            history_limit: env_parse("ASSISTANT_HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT).max(1),
            prompt_history: env_parse("ASSISTANT_PROMPT_HISTORY", DEFAULT_PROMPT_HISTORY),
            llm_timeout: Duration::from_secs(env_parse("ASSISTANT_LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT_SECS)),
            max_tokens: env_parse("ASSISTANT_MAX_TOKENS", DEFAULT_MAX_TOKENS),
            candidate_limit: env_parse("ASSISTANT_CANDIDATE_LIMIT", DEFAULT_CANDIDATE_LIMIT),
            sample_size: env_parse("ASSISTANT_SAMPLE_SIZE", DEFAULT_SAMPLE_SIZE),
            rng_seed: std::env::var("ASSISTANT_RNG_SEED")
                .ok()
                .and_then(|v| v.trim().parse().ok()),
            tuning: MatchTuning {
                keep_threshold: env_parse("ASSISTANT_KEEP_THRESHOLD", defaults.keep_threshold),
                broad_keep_threshold: env_parse("ASSISTANT_BROAD_KEEP_THRESHOLD", defaults.broad_keep_threshold),
                token_boost: env_parse("ASSISTANT_TOKEN_BOOST", defaults.token_boost),
                near_boost: env_parse("ASSISTANT_NEAR_BOOST", defaults.near_boost),
                follow_up_similarity: env_parse("ASSISTANT_FOLLOW_UP_SIMILARITY", defaults.follow_up_similarity),
            },
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
