// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide tunables for the Orchestrator Core, loaded once at startup.
//!
//! Every field has a default matching spec.md §6 and an `AURA_`-prefixed
//! env var override, following the same `clap::Parser` derive the teacher
//! uses for its own `Config` (both a CLI parser and an env-var source).

use std::time::Duration;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "aura-core", about = "AURA orchestrator core configuration")]
pub struct Config {
    /// Minimum confidence for an intent to be trusted; below this, the
    /// orchestrator falls back to GUI_INTERACTION.
    #[arg(long, env = "AURA_INTENT_CONFIDENCE_THRESHOLD", default_value = "0.7")]
    pub intent_confidence_threshold: f64,

    /// Timeout for acquiring the execution lock.
    #[arg(long, env = "AURA_EXECUTION_LOCK_TIMEOUT_SECS", default_value = "30")]
    pub execution_lock_timeout_secs: u64,

    /// Timeout for acquiring the intent lock.
    #[arg(long, env = "AURA_INTENT_LOCK_TIMEOUT_SECS", default_value = "10")]
    pub intent_lock_timeout_secs: u64,

    /// Timeout for the deferred handler's click-time re-acquire of the
    /// execution lock.
    #[arg(long, env = "AURA_DEFERRED_REACQUIRE_TIMEOUT_SECS", default_value = "15")]
    pub deferred_reacquire_timeout_secs: u64,

    /// Default budget for a deferred action waiting on a click.
    #[arg(long, env = "AURA_DEFERRED_TIMEOUT_DEFAULT_SECS", default_value = "600")]
    pub deferred_timeout_default_secs: u64,

    /// Minimum allowed deferred timeout; values below this are clamped up.
    #[arg(long, env = "AURA_DEFERRED_TIMEOUT_MIN_SECS", default_value = "60")]
    pub deferred_timeout_min_secs: u64,

    /// Maximum allowed deferred timeout; values above this are clamped down.
    #[arg(long, env = "AURA_DEFERRED_TIMEOUT_MAX_SECS", default_value = "900")]
    pub deferred_timeout_max_secs: u64,

    /// Maximum fast-path retries for retryable accessibility errors.
    #[arg(long, env = "AURA_FAST_PATH_RETRY_MAX", default_value = "2")]
    pub fast_path_retry_max: u32,

    /// Base exponential backoff delay between fast-path retries.
    #[arg(long, env = "AURA_BACKOFF_BASE_MS", default_value = "50")]
    pub backoff_base_ms: u64,

    /// Minimum similarity score (0-100) for fuzzy label matching.
    #[arg(long, env = "AURA_FUZZY_MATCH_THRESHOLD", default_value = "85")]
    pub fuzzy_match_threshold: u8,

    /// Wall-clock budget for browser/PDF text extraction.
    #[arg(long, env = "AURA_QA_EXTRACTION_BUDGET_MS", default_value = "2000")]
    pub qa_extraction_budget_ms: u64,

    /// Wall-clock budget for reasoning-model summarization.
    #[arg(long, env = "AURA_QA_SUMMARIZE_BUDGET_MS", default_value = "3000")]
    pub qa_summarize_budget_ms: u64,

    /// Soft end-to-end budget for the question-answering fast path.
    #[arg(long, env = "AURA_QA_TOTAL_BUDGET_MS", default_value = "5000")]
    pub qa_total_budget_ms: u64,

    /// Maximum bytes of extracted content passed to the reasoning model.
    #[arg(long, env = "AURA_CONTENT_MAX_BYTES", default_value = "51200")]
    pub content_max_bytes: usize,

    /// Maximum number of turns retained in conversation history.
    #[arg(long, env = "AURA_CONVERSATION_HISTORY_MAX", default_value = "10")]
    pub conversation_history_max: usize,
}

impl Default for Config {
    fn default() -> Self {
        // clap::Parser::parse_from(&[] as &[&str]) would require a binary
        // name; construct defaults directly so library callers (and tests)
        // don't need a CLI context.
        Self {
            intent_confidence_threshold: 0.7,
            execution_lock_timeout_secs: 30,
            intent_lock_timeout_secs: 10,
            deferred_reacquire_timeout_secs: 15,
            deferred_timeout_default_secs: 600,
            deferred_timeout_min_secs: 60,
            deferred_timeout_max_secs: 900,
            fast_path_retry_max: 2,
            backoff_base_ms: 50,
            fuzzy_match_threshold: 85,
            qa_extraction_budget_ms: 2000,
            qa_summarize_budget_ms: 3000,
            qa_total_budget_ms: 5000,
            content_max_bytes: 50 * 1024,
            conversation_history_max: 10,
        }
    }
}

impl Config {
    /// Validate the configuration after parsing, rejecting values that
    /// would make the system unsafe or meaningless.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.intent_confidence_threshold) {
            anyhow::bail!(
                "intent-confidence-threshold must be in [0, 1], got {}",
                self.intent_confidence_threshold
            );
        }
        if self.deferred_timeout_min_secs > self.deferred_timeout_max_secs {
            anyhow::bail!(
                "deferred-timeout-min ({}) must not exceed deferred-timeout-max ({})",
                self.deferred_timeout_min_secs,
                self.deferred_timeout_max_secs
            );
        }
        if self.fuzzy_match_threshold > 100 {
            anyhow::bail!("fuzzy-match-threshold must be in [0, 100], got {}", self.fuzzy_match_threshold);
        }
        if self.content_max_bytes == 0 {
            anyhow::bail!("content-max-bytes must be non-zero");
        }
        Ok(())
    }

    pub fn execution_lock_timeout(&self) -> Duration {
        Duration::from_secs(self.execution_lock_timeout_secs)
    }

    pub fn intent_lock_timeout(&self) -> Duration {
        Duration::from_secs(self.intent_lock_timeout_secs)
    }

    pub fn deferred_reacquire_timeout(&self) -> Duration {
        Duration::from_secs(self.deferred_reacquire_timeout_secs)
    }

    /// Clamp a requested deferred timeout into `[MIN, MAX]` (spec §8 boundary
    /// behavior). `None` uses the configured default.
    pub fn clamp_deferred_timeout(&self, requested: Option<Duration>) -> Duration {
        let min = Duration::from_secs(self.deferred_timeout_min_secs);
        let max = Duration::from_secs(self.deferred_timeout_max_secs);
        let value = requested.unwrap_or_else(|| Duration::from_secs(self.deferred_timeout_default_secs));
        value.clamp(min, max)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn qa_extraction_budget(&self) -> Duration {
        Duration::from_millis(self.qa_extraction_budget_ms)
    }

    pub fn qa_summarize_budget(&self) -> Duration {
        Duration::from_millis(self.qa_summarize_budget_ms)
    }

    pub fn qa_total_budget(&self) -> Duration {
        Duration::from_millis(self.qa_total_budget_ms)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
