// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Orchestrator Core: turns a transcribed utterance into a routed,
//! executed [`HandlerResult`] (spec §2 dataflow).
//!
//! ```text
//! utterance -> (execution_lock.acquire with timeout)
//!           -> IntentRecognizer::classify (acquires its own intent_lock)
//!           -> Registry::select
//!           -> Handler::handle
//!           -> release execution_lock (early if WAITING_FOR_USER_ACTION,
//!              otherwise at the end of this call)
//! ```
//!
//! Grounded on the teacher's `Supervisor::dispatch`, which resolves a
//! detector through a composite chain, acquires a state-mutating guard, and
//! releases it on every exit path without ever holding it across a
//! collaborator call it doesn't own.

use std::sync::Arc;

use tracing::{info, warn};

use crate::collaborators::{AccessibilityClient, Automation, AudioFeedbackSink, BrowserExtractor, MouseCapture, PdfExtractor, ReasoningClient, VisionClient};
use crate::concurrency::Locks;
use crate::config::Config;
use crate::handlers::{ConversationHandler, DeferredHandler, GuiHandler, QaHandler};
use crate::intent::{Intent, IntentKind, IntentRecognizer};
use crate::registry::{HandlerContext, Registry};
use crate::result::{HandlerResult, Method};
use crate::utterance::Utterance;

/// Every collaborator the Orchestrator needs to wire up its handlers.
/// Grouped into one struct so [`Orchestrator::new`] doesn't take a dozen
/// positional arguments.
pub struct Collaborators {
    pub reasoning: Arc<dyn ReasoningClient>,
    pub vision: Arc<dyn VisionClient>,
    pub accessibility: Arc<dyn AccessibilityClient>,
    pub automation: Arc<dyn Automation>,
    pub browser: Arc<dyn BrowserExtractor>,
    pub pdf: Arc<dyn PdfExtractor>,
    pub mouse: Arc<dyn MouseCapture>,
    pub audio_sink: Arc<dyn AudioFeedbackSink>,
}

/// The central command scheduler. Owns the locks, the handler registry, and
/// a reasoning handle kept separately for intent classification (spec §4.B
/// runs before a handler is even selected, so it can't live inside the
/// Registry).
pub struct Orchestrator {
    config: Config,
    locks: Locks,
    registry: Registry,
    reasoning: Arc<dyn ReasoningClient>,
}

impl Orchestrator {
    pub fn new(config: Config, default_app: impl Into<String>, collaborators: Collaborators) -> Self {
        let default_app = default_app.into();
        let locks = Locks::new();

        let gui = GuiHandler::new(
            Arc::clone(&collaborators.accessibility),
            Arc::clone(&collaborators.automation),
            Arc::clone(&collaborators.vision),
            Arc::clone(&collaborators.audio_sink),
            default_app.clone(),
            config.fuzzy_match_threshold,
            config.fast_path_retry_max,
            config.backoff_base(),
        );

        let qa = QaHandler::new(
            Arc::clone(&collaborators.accessibility),
            Arc::clone(&collaborators.browser),
            Arc::clone(&collaborators.pdf),
            Arc::clone(&collaborators.reasoning),
            Arc::clone(&collaborators.vision),
            Arc::clone(&collaborators.audio_sink),
            default_app.clone(),
            config.content_max_bytes,
            config.qa_extraction_budget(),
            config.qa_summarize_budget(),
            config.qa_total_budget(),
        );

        let conversation = ConversationHandler::new(
            Arc::clone(&collaborators.reasoning),
            Arc::clone(&collaborators.audio_sink),
            config.conversation_history_max,
        );

        let deferred = DeferredHandler::new(
            Arc::clone(&collaborators.reasoning),
            Arc::clone(&collaborators.automation),
            Arc::clone(&collaborators.mouse),
            Arc::clone(&collaborators.audio_sink),
            Arc::clone(&locks.execution),
            config.deferred_reacquire_timeout(),
            std::time::Duration::from_secs(config.deferred_timeout_default_secs),
            std::time::Duration::from_secs(config.deferred_timeout_min_secs),
            std::time::Duration::from_secs(config.deferred_timeout_max_secs),
        );

        let mut registry = Registry::new();
        registry.register(IntentKind::GuiInteraction, Box::new(gui));
        registry.register(IntentKind::QuestionAnswering, Box::new(qa));
        registry.register(IntentKind::ConversationalChat, Box::new(conversation));
        registry.register(IntentKind::DeferredAction, Box::new(deferred));

        Self { config, locks, registry, reasoning: collaborators.reasoning }
    }

    /// Run a single utterance through the full dataflow: acquire, classify,
    /// route, execute, release.
    pub async fn execute(&self, utterance: &Utterance) -> HandlerResult {
        let correlation_id = utterance.id;
        info!(correlation_id = %correlation_id, text = %utterance.text, "utterance received");

        let guard = match self.locks.execution.try_acquire(self.config.execution_lock_timeout()).await {
            Ok(guard) => guard,
            Err(err) => {
                warn!(correlation_id = %correlation_id, "execution lock timed out, system busy");
                return HandlerResult::error(
                    Method::FastPath,
                    correlation_id,
                    crate::result::Timings::start().finish(),
                    err.kind,
                );
            }
        };

        let intent = self.classify(&utterance.text).await;
        info!(correlation_id = %correlation_id, kind = intent.kind.as_str(), fallback = intent.fallback, "intent routed");

        let result = match self.registry.select(&intent) {
            Ok(handler) => handler.handle(HandlerContext { utterance, intent: &intent }).await,
            Err(err) => HandlerResult::error(
                Method::FastPath,
                correlation_id,
                crate::result::Timings::start().finish(),
                err.kind,
            ),
        };

        // Release now rather than at end of scope: for WAITING_FOR_USER_ACTION
        // the Deferred Action Handler has already spawned a background task
        // that re-acquires this same lock on click, and holding it any
        // longer here would make that re-acquire wait out its own timeout
        // (spec §4.H).
        guard.release();

        info!(correlation_id = %correlation_id, status = ?result.status, method = ?result.method, "utterance handled");
        result
    }

    async fn classify(&self, text: &str) -> Intent {
        let recognizer =
            IntentRecognizer::new(self.reasoning.as_ref(), self.config.intent_confidence_threshold, self.config.intent_lock_timeout());
        recognizer.classify(text, &self.locks.intent).await
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
