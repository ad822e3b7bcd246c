use super::*;
use std::sync::{Mutex, PoisonError};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// # Safety
/// Callers hold `ENV_LOCK` so no other test in this module touches the env concurrently.
unsafe fn clear_assistant_env() {
    unsafe {
        for key in [
            "ASSISTANT_HISTORY_LIMIT",
            "ASSISTANT_PROMPT_HISTORY",
            "ASSISTANT_LLM_TIMEOUT_SECS",
            "ASSISTANT_MAX_TOKENS",
            "ASSISTANT_CANDIDATE_LIMIT",
            "ASSISTANT_SAMPLE_SIZE",
            "ASSISTANT_RNG_SEED",
            "ASSISTANT_KEEP_THRESHOLD",
            "ASSISTANT_BROAD_KEEP_THRESHOLD",
            "ASSISTANT_TOKEN_BOOST",
            "ASSISTANT_NEAR_BOOST",
            "ASSISTANT_FOLLOW_UP_SIMILARITY",
        ] {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn from_env_defaults() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    unsafe { clear_assistant_env() };

    let cfg = EngineConfig::from_env();
    assert_eq!(cfg, EngineConfig::default());
    assert_eq!(cfg.history_limit, 20);
    assert_eq!(cfg.llm_timeout, Duration::from_secs(30));
    assert_eq!(cfg.sample_size, 200);
    assert!(cfg.rng_seed.is_none());
    assert!((cfg.tuning.keep_threshold - 0.55).abs() < f64::EPSILON);
    assert!((cfg.tuning.broad_keep_threshold - 0.45).abs() < f64::EPSILON);
}

#[test]
fn from_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    unsafe {
        clear_assistant_env();
        std::env::set_var("ASSISTANT_HISTORY_LIMIT", "8");
        std::env::set_var("ASSISTANT_LLM_TIMEOUT_SECS", "5");
        std::env::set_var("ASSISTANT_RNG_SEED", "42");
        std::env::set_var("ASSISTANT_KEEP_THRESHOLD", "0.6");
    }

    let cfg = EngineConfig::from_env();
    assert_eq!(cfg.history_limit, 8);
    assert_eq!(cfg.llm_timeout, Duration::from_secs(5));
    assert_eq!(cfg.rng_seed, Some(42));
    assert!((cfg.tuning.keep_threshold - 0.6).abs() < f64::EPSILON);

    unsafe { clear_assistant_env() };
}

#[test]
fn from_env_ignores_garbage_and_zero_history() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    unsafe {
        clear_assistant_env();
        std::env::set_var("ASSISTANT_SAMPLE_SIZE", "lots");
        std::env::set_var("ASSISTANT_HISTORY_LIMIT", "0");
    }

    let cfg = EngineConfig::from_env();
    assert_eq!(cfg.sample_size, DEFAULT_SAMPLE_SIZE);
    assert_eq!(cfg.history_limit, 1);

    unsafe { clear_assistant_env() };
}
