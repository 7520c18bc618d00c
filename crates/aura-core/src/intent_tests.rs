// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;

use super::*;
use crate::collaborators::BoxFuture;

struct FakeReasoning {
    reply: Result<Value, HandlerError>,
}

impl ReasoningClient for FakeReasoning {
    fn complete(&self, _prompt: &str) -> BoxFuture<'_, Result<Value, HandlerError>> {
        let reply = self.reply.clone();
        Box::pin(async move { reply })
    }
}

fn ok(value: Value) -> FakeReasoning {
    FakeReasoning { reply: Ok(value) }
}

#[tokio::test]
async fn classifies_high_confidence_gui_interaction() {
    let reasoning = ok(json!({"intent": "GUI_INTERACTION", "confidence": 0.96, "parameters": {"label": "gmail"}}));
    let recognizer = IntentRecognizer::new(&reasoning, 0.7, Duration::from_secs(1));
    let lock = NamedLock::new("intent");

    let intent = recognizer.classify("click on the gmail link", &lock).await;
    assert_eq!(intent.kind, IntentKind::GuiInteraction);
    assert!(!intent.fallback);
    assert_eq!(intent.parameters.get("label").and_then(Value::as_str), Some("gmail"));
}

#[tokio::test]
async fn falls_back_below_confidence_threshold() {
    let reasoning = ok(json!({"intent": "QUESTION_ANSWERING", "confidence": 0.4}));
    let recognizer = IntentRecognizer::new(&reasoning, 0.7, Duration::from_secs(1));
    let lock = NamedLock::new("intent");

    let intent = recognizer.classify("what does this say", &lock).await;
    assert_eq!(intent.kind, IntentKind::GuiInteraction);
    assert!(intent.fallback);
    assert_eq!(intent.reason.as_deref(), Some("low_confidence"));
}

#[tokio::test]
async fn falls_back_on_unknown_label() {
    let reasoning = ok(json!({"intent": "DO_A_BACKFLIP", "confidence": 0.9}));
    let recognizer = IntentRecognizer::new(&reasoning, 0.7, Duration::from_secs(1));
    let lock = NamedLock::new("intent");

    let intent = recognizer.classify("nonsense", &lock).await;
    assert!(intent.fallback);
    assert_eq!(intent.reason.as_deref(), Some("unknown_intent_label"));
}

#[tokio::test]
async fn clamps_out_of_range_confidence() {
    let reasoning = ok(json!({"intent": "CONVERSATIONAL_CHAT", "confidence": 1.7}));
    let recognizer = IntentRecognizer::new(&reasoning, 0.7, Duration::from_secs(1));
    let lock = NamedLock::new("intent");

    let intent = recognizer.classify("tell me a joke", &lock).await;
    assert_eq!(intent.kind, IntentKind::ConversationalChat);
    assert_eq!(intent.confidence, 1.0);
    assert!(!intent.fallback);
}

#[tokio::test]
async fn falls_back_when_reasoning_collaborator_errors() {
    let reasoning = FakeReasoning {
        reply: Err(HandlerError::new(ErrorKind::ReasoningUnavailable, "down")),
    };
    let recognizer = IntentRecognizer::new(&reasoning, 0.7, Duration::from_secs(1));
    let lock = NamedLock::new("intent");

    let intent = recognizer.classify("do something", &lock).await;
    assert_eq!(intent.kind, IntentKind::GuiInteraction);
    assert_eq!(intent.reason.as_deref(), Some("reasoning_unavailable"));
}

#[tokio::test]
async fn extracts_json_wrapped_in_prose_reply() {
    let reasoning = ok(json!("Here you go:\n```json\n{\"intent\": \"DEFERRED_ACTION\", \"confidence\": 0.91}\n```"));
    let recognizer = IntentRecognizer::new(&reasoning, 0.7, Duration::from_secs(1));
    let lock = NamedLock::new("intent");

    let intent = recognizer.classify("write me a function", &lock).await;
    assert_eq!(intent.kind, IntentKind::DeferredAction);
    assert!(!intent.fallback);
}

#[tokio::test]
async fn guard_clause_fallback_is_usable_directly() {
    let reasoning = ok(json!({}));
    let recognizer = IntentRecognizer::new(&reasoning, 0.7, Duration::from_secs(1));
    let intent = recognizer.fallback(0.0, "reasoning_unavailable");
    assert_eq!(intent.kind, IntentKind::GuiInteraction);
    assert_eq!(intent.confidence, 0.0);
    assert!(intent.fallback);
}
