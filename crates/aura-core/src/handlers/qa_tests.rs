// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use super::*;
use crate::collaborators::{AudioFeedbackSink, AudioPriority, UiElement};
use crate::intent::Intent;
use crate::utterance::Utterance;

struct FakeAccessibility {
    frontmost: Result<String, HandlerError>,
}

impl AccessibilityClient for FakeAccessibility {
    fn frontmost_app(&self) -> BoxFuture<'_, Result<String, HandlerError>> {
        let result = self.frontmost.clone();
        Box::pin(async move { result })
    }
    fn find_element(&self, _label: &str) -> BoxFuture<'_, Result<Option<UiElement>, HandlerError>> {
        Box::pin(async { Ok(None) })
    }
    fn list_elements(&self) -> BoxFuture<'_, Result<Vec<UiElement>, HandlerError>> {
        Box::pin(async { Ok(Vec::new()) })
    }
}

struct FakeBrowser {
    text: Result<String, HandlerError>,
}

impl BrowserExtractor for FakeBrowser {
    fn extract_visible_text(&self) -> BoxFuture<'_, Result<String, HandlerError>> {
        let text = self.text.clone();
        Box::pin(async move { text })
    }
}

struct FakePdf;
impl PdfExtractor for FakePdf {
    fn extract_visible_text(&self) -> BoxFuture<'_, Result<String, HandlerError>> {
        Box::pin(async { Err(HandlerError::new(ErrorKind::ModuleUnavailable, "not a pdf")) })
    }
}

struct FakeReasoning {
    reply: Result<Value, HandlerError>,
}

impl ReasoningClient for FakeReasoning {
    fn complete(&self, _prompt: &str) -> BoxFuture<'_, Result<Value, HandlerError>> {
        let reply = self.reply.clone();
        Box::pin(async move { reply })
    }
}

struct FakeVision {
    plan: Result<Value, HandlerError>,
}

impl VisionClient for FakeVision {
    fn capture_and_analyze(&self, _prompt: &str) -> BoxFuture<'_, Result<Value, HandlerError>> {
        let plan = self.plan.clone();
        Box::pin(async move { plan })
    }
}

struct SilentAudio;
impl AudioFeedbackSink for SilentAudio {
    fn play_sound(&self, _sound_id: &str, _priority: AudioPriority) -> BoxFuture<'_, Result<(), HandlerError>> {
        Box::pin(async { Ok(()) })
    }
    fn speak(&self, _text: &str, _priority: AudioPriority) -> BoxFuture<'_, Result<(), HandlerError>> {
        Box::pin(async { Ok(()) })
    }
}

fn qa_intent() -> Intent {
    Intent { kind: IntentKind::QuestionAnswering, confidence: 0.9, parameters: HashMap::new(), fallback: false, reason: None }
}

const LONG_PAGE_TEXT: &str = "This page discusses a wide variety of topics related to software engineering, \
    testing practices, and how teams collaborate across timezones to ship reliable systems consistently.";

fn make_handler(
    accessibility: FakeAccessibility,
    browser: FakeBrowser,
    pdf: FakePdf,
    reasoning: FakeReasoning,
    vision: FakeVision,
) -> QaHandler {
    QaHandler::new(
        Arc::new(accessibility),
        Arc::new(browser),
        Arc::new(pdf),
        Arc::new(reasoning),
        Arc::new(vision),
        Arc::new(SilentAudio),
        "unknown",
        50 * 1024,
        Duration::from_secs(2),
        Duration::from_secs(3),
        Duration::from_secs(5),
    )
}

#[tokio::test]
async fn browser_fast_path_summarizes_extracted_text() {
    let accessibility = FakeAccessibility { frontmost: Ok("Google Chrome".into()) };
    let browser = FakeBrowser { text: Ok(LONG_PAGE_TEXT.to_owned()) };
    let pdf = FakePdf;
    let reasoning = FakeReasoning { reply: Ok(json!({"message": "A summary of the page."})) };
    let vision = FakeVision { plan: Err(HandlerError::new(ErrorKind::InternalError, "must not be called")) };

    let handler = make_handler(accessibility, browser, pdf, reasoning, vision);

    let utterance = Utterance::new("what's on my screen");
    let intent = qa_intent();
    let result = handler.handle(HandlerContext { utterance: &utterance, intent: &intent }).await;

    assert!(result.is_success());
    assert_eq!(result.method, Method::FastPath);
    assert_eq!(result.payload.as_deref(), Some("A summary of the page."));
}

#[tokio::test]
async fn non_browser_non_pdf_app_falls_back_to_vision() {
    let accessibility = FakeAccessibility { frontmost: Ok("Finder".into()) };
    let browser = FakeBrowser { text: Err(HandlerError::new(ErrorKind::InternalError, "must not be called")) };
    let pdf = FakePdf;
    let reasoning = FakeReasoning { reply: Err(HandlerError::new(ErrorKind::InternalError, "must not be called")) };
    let vision = FakeVision { plan: Ok(json!({"description": "A desktop with several icons."})) };

    let handler = make_handler(accessibility, browser, pdf, reasoning, vision);

    let utterance = Utterance::new("what's on my screen");
    let intent = qa_intent();
    let result = handler.handle(HandlerContext { utterance: &utterance, intent: &intent }).await;

    assert!(result.is_success());
    assert_eq!(result.method, Method::SlowPath);
    assert_eq!(result.payload.as_deref(), Some("A desktop with several icons."));
}

#[tokio::test]
async fn noisy_extraction_falls_back_to_vision() {
    let accessibility = FakeAccessibility { frontmost: Ok("Google Chrome".into()) };
    let browser = FakeBrowser { text: Ok("short".into()) };
    let pdf = FakePdf;
    let reasoning = FakeReasoning { reply: Err(HandlerError::new(ErrorKind::InternalError, "must not be called")) };
    let vision = FakeVision { plan: Ok(json!({"description": "fallback description"})) };

    let handler = make_handler(accessibility, browser, pdf, reasoning, vision);

    let utterance = Utterance::new("what's on my screen");
    let intent = qa_intent();
    let result = handler.handle(HandlerContext { utterance: &utterance, intent: &intent }).await;

    assert_eq!(result.method, Method::SlowPath);
}

#[tokio::test]
async fn summarization_failure_uses_extractive_fallback_summary() {
    let accessibility = FakeAccessibility { frontmost: Ok("Google Chrome".into()) };
    let browser = FakeBrowser { text: Ok(LONG_PAGE_TEXT.to_owned()) };
    let pdf = FakePdf;
    let reasoning = FakeReasoning { reply: Err(HandlerError::new(ErrorKind::ReasoningTimeout, "slow")) };
    let vision = FakeVision { plan: Err(HandlerError::new(ErrorKind::InternalError, "must not be called")) };

    let handler = make_handler(accessibility, browser, pdf, reasoning, vision);

    let utterance = Utterance::new("summarize this");
    let intent = qa_intent();
    let result = handler.handle(HandlerContext { utterance: &utterance, intent: &intent }).await;

    assert!(result.is_success());
    assert_eq!(result.method, Method::FastPath);
    assert!(result.payload.unwrap().contains("software engineering"));
}

#[test]
fn truncate_at_word_boundary_never_splits_mid_word() {
    let text = "the quick brown fox jumps over the lazy dog";
    let truncated = truncate_at_word_boundary(text, 12);
    assert_eq!(truncated, "the quick");
    assert!(truncated.len() <= 12);
}

#[test]
fn summary_style_detects_bullet_points_request() {
    assert_eq!(summary_style("give me the key points"), SummaryStyle::BulletPoints);
    assert_eq!(summary_style("summarize this page"), SummaryStyle::Concise);
    assert_eq!(summary_style("what's on my screen"), SummaryStyle::Descriptive);
}
