// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Intent recognition: turning a transcribed [`crate::utterance::Utterance`]
//! into a [`Intent`] the Registry can route on.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::collaborators::ReasoningClient;
use crate::concurrency::NamedLock;
use crate::envelope;
use crate::error::{ErrorKind, HandlerError};

/// The kind of action an utterance maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentKind {
    GuiInteraction,
    QuestionAnswering,
    ConversationalChat,
    DeferredAction,
}

impl IntentKind {
    fn from_label(label: &str) -> Option<Self> {
        match label {
            "GUI_INTERACTION" => Some(Self::GuiInteraction),
            "QUESTION_ANSWERING" => Some(Self::QuestionAnswering),
            "CONVERSATIONAL_CHAT" => Some(Self::ConversationalChat),
            "DEFERRED_ACTION" => Some(Self::DeferredAction),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GuiInteraction => "GUI_INTERACTION",
            Self::QuestionAnswering => "QUESTION_ANSWERING",
            Self::ConversationalChat => "CONVERSATIONAL_CHAT",
            Self::DeferredAction => "DEFERRED_ACTION",
        }
    }
}

/// The normalized result of intent recognition.
///
/// Invariant: `kind` is always set. When confidence falls below the
/// configured threshold, `kind` is forced to [`IntentKind::GuiInteraction`]
/// (the safe default), `fallback` is `true`, and `reason` explains why.
#[derive(Debug, Clone, Serialize)]
pub struct Intent {
    pub kind: IntentKind,
    pub confidence: f64,
    pub parameters: HashMap<String, Value>,
    pub fallback: bool,
    pub reason: Option<String>,
}

impl Intent {
    fn fallback_gui(confidence: f64, reason: &'static str) -> Self {
        Self {
            kind: IntentKind::GuiInteraction,
            confidence,
            parameters: HashMap::new(),
            fallback: true,
            reason: Some(reason.to_owned()),
        }
    }
}

/// Classifies utterances into [`Intent`]s by prompting a reasoning
/// collaborator and normalizing its reply.
pub struct IntentRecognizer<'a> {
    reasoning: &'a dyn ReasoningClient,
    threshold: f64,
    lock_timeout: Duration,
}

impl<'a> IntentRecognizer<'a> {
    pub fn new(reasoning: &'a dyn ReasoningClient, threshold: f64, lock_timeout: Duration) -> Self {
        Self { reasoning, threshold, lock_timeout }
    }

    /// Classify `text`:
    ///
    /// 1. The reasoning collaborator is assumed reachable; callers that
    ///    already know it is down should call [`Self::fallback`] directly
    ///    instead of invoking this.
    /// 2. Acquire the intent lock with a timeout.
    /// 3. Send a structured prompt.
    /// 4. Parse the response robustly via [`crate::envelope`].
    /// 5. Validate: unknown labels fall back; confidence outside `[0, 1]`
    ///    is clamped; confidence below threshold falls back.
    /// 6. Return the normalized intent.
    pub async fn classify(&self, text: &str, intent_lock: &NamedLock) -> Intent {
        let _guard = match intent_lock.try_acquire(self.lock_timeout).await {
            Ok(guard) => guard,
            Err(_) => return self.fallback(0.0, "intent_lock_timeout"),
        };

        let prompt = build_classification_prompt(text);
        let reply = match self.reasoning.complete(&prompt).await {
            Ok(value) => value,
            Err(err) => {
                warn!(kind = %err.kind, "reasoning collaborator failed during intent classification");
                return self.fallback(0.0, "reasoning_unavailable");
            }
        };

        self.normalize(&reply)
    }

    /// The guard-clause fallback used when the reasoning collaborator is
    /// known to be unavailable before a call is even attempted.
    pub fn fallback(&self, confidence: f64, reason: &'static str) -> Intent {
        Intent::fallback_gui(confidence, reason)
    }

    fn normalize(&self, reply: &Value) -> Intent {
        let object = envelope::extract_text(reply)
            .and_then(|text| envelope::extract_json_object(&text))
            .or_else(|| reply.is_object().then(|| reply.clone()));

        let Some(object) = object else {
            warn!("intent reply did not contain a parseable JSON object");
            return self.fallback(0.0, "unparseable_response");
        };

        let Some(label) = object.get("intent").and_then(Value::as_str) else {
            return self.fallback(0.0, "missing_intent_field");
        };

        let Some(kind) = IntentKind::from_label(label) else {
            warn!(label, "unknown intent label, falling back");
            return self.fallback(0.0, "unknown_intent_label");
        };

        let raw_confidence = object.get("confidence").and_then(Value::as_f64).unwrap_or(0.0);
        let confidence = raw_confidence.clamp(0.0, 1.0);

        if confidence < self.threshold {
            return self.fallback(confidence, "low_confidence");
        }

        let parameters = object
            .get("parameters")
            .and_then(Value::as_object)
            .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();

        let reason = object.get("reasoning").and_then(Value::as_str).map(str::to_owned);

        info!(kind = kind.as_str(), confidence, "intent classified");

        Intent { kind, confidence, parameters, fallback: false, reason }
    }
}

fn build_classification_prompt(text: &str) -> String {
    format!(
        "Classify the following voice command into exactly one intent: \
         GUI_INTERACTION, QUESTION_ANSWERING, CONVERSATIONAL_CHAT, or DEFERRED_ACTION. \
         Respond with a single JSON object: \
         {{\"intent\": <label>, \"confidence\": <0..1>, \"parameters\": {{...}}}}.\n\n\
         Command: {text}"
    )
}

#[cfg(test)]
#[path = "intent_tests.rs"]
mod tests;
