// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Answers questions about whatever is currently visible on screen (spec
//! §4.E). Fast path extracts text from a browser or PDF viewer and
//! summarizes it; slow path falls back to vision description.
//!
//! Extraction and summarization each run under a `tokio::time::timeout`
//! wall-clock budget rather than a signal-based timer (spec §5 "Suspension
//! points", §9 REDESIGN FLAGS "signal-based timeouts are unsafe outside the
//! main thread"). The end-to-end budget is a soft SLO: it is logged, never
//! enforced as a failure (spec §4.E "Timing targets").

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{info, warn};

use crate::audio::AudioFacade;
use crate::collaborators::{
    AccessibilityClient, AudioFeedbackSink, BoxFuture, BrowserExtractor, PdfExtractor, ReasoningClient, VisionClient,
};
use crate::envelope;
use crate::error::{ErrorKind, HandlerError};
use crate::handlers::shared;
use crate::intent::IntentKind;
use crate::registry::{Handler, HandlerContext};
use crate::result::{HandlerResult, Method, Timings};

const MIN_CONTENT_CHARS: usize = 50;
const MIN_WORD_COUNT: usize = 10;
const NOISE_SYMBOLS: &[char] = &['|', '»', '«', '•'];

/// Which extraction path the active application supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppKind {
    Browser,
    PdfReader,
    Other,
}

fn classify_app(name: &str) -> AppKind {
    let lower = name.to_lowercase();
    if lower.contains("chrome") || lower.contains("safari") || lower.contains("firefox") || lower.contains("edge") {
        AppKind::Browser
    } else if lower.contains("preview") || lower.contains("acrobat") || lower.contains("pdf") {
        AppKind::PdfReader
    } else {
        AppKind::Other
    }
}

/// Phrasing the user used, which shapes the summarization prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SummaryStyle {
    Descriptive,
    Concise,
    BulletPoints,
}

fn summary_style(utterance_text: &str) -> SummaryStyle {
    let lower = utterance_text.to_lowercase();
    if lower.contains("key point") || lower.contains("bullet") {
        SummaryStyle::BulletPoints
    } else if lower.contains("summarize") || lower.contains("summary") {
        SummaryStyle::Concise
    } else {
        SummaryStyle::Descriptive
    }
}

/// Reject obviously unusable extracted text: too short, too few words, or
/// dominated by UI chrome symbols (spec §4.E.3).
fn passes_noise_filter(text: &str) -> bool {
    if text.chars().count() < MIN_CONTENT_CHARS {
        return false;
    }
    let word_count = text.split_whitespace().count();
    if word_count < MIN_WORD_COUNT {
        return false;
    }
    let symbol_count = text.chars().filter(|c| NOISE_SYMBOLS.contains(c)).count();
    (symbol_count as f64 / text.chars().count() as f64) < 0.1
}

/// Truncate to `max_bytes` without splitting a word (spec §8 boundary
/// behavior): search backward from the byte limit to the nearest
/// whitespace.
fn truncate_at_word_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    match text[..end].rfind(char::is_whitespace) {
        Some(boundary) => &text[..boundary],
        None => &text[..end],
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fallback_summary(text: &str, max_words: usize) -> String {
    let sentences: Vec<&str> = text.split(". ").collect();
    let mut summary = String::new();
    for sentence in sentences {
        if summary.split_whitespace().count() >= max_words {
            break;
        }
        if !summary.is_empty() {
            summary.push_str(". ");
        }
        summary.push_str(sentence.trim());
    }
    summary
}

/// Answers "what's on my screen" style questions.
pub struct QaHandler {
    accessibility: Arc<dyn AccessibilityClient>,
    browser: Arc<dyn BrowserExtractor>,
    pdf: Arc<dyn PdfExtractor>,
    reasoning: Arc<dyn ReasoningClient>,
    vision: Arc<dyn VisionClient>,
    audio_sink: Arc<dyn AudioFeedbackSink>,
    default_app: String,
    content_max_bytes: usize,
    extraction_budget: Duration,
    summarize_budget: Duration,
    total_budget: Duration,
}

impl QaHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        accessibility: Arc<dyn AccessibilityClient>,
        browser: Arc<dyn BrowserExtractor>,
        pdf: Arc<dyn PdfExtractor>,
        reasoning: Arc<dyn ReasoningClient>,
        vision: Arc<dyn VisionClient>,
        audio_sink: Arc<dyn AudioFeedbackSink>,
        default_app: impl Into<String>,
        content_max_bytes: usize,
        extraction_budget: Duration,
        summarize_budget: Duration,
        total_budget: Duration,
    ) -> Self {
        Self {
            accessibility,
            browser,
            pdf,
            reasoning,
            vision,
            audio_sink,
            default_app: default_app.into(),
            content_max_bytes,
            extraction_budget,
            summarize_budget,
            total_budget,
        }
    }

    fn audio(&self) -> AudioFacade<'_> {
        AudioFacade::new(self.audio_sink.as_ref())
    }

    async fn fast_path(&self, utterance_text: &str) -> Result<String, HandlerError> {
        let started = tokio::time::Instant::now();
        let app = shared::detect_active_app(self.accessibility.as_ref(), &self.default_app).await?;
        let kind = classify_app(&app);

        let raw = match kind {
            AppKind::Browser => self.extract_with_budget(|| self.browser.extract_visible_text()).await?,
            AppKind::PdfReader => self.extract_with_budget(|| self.pdf.extract_visible_text()).await?,
            AppKind::Other => {
                return Err(HandlerError::new(ErrorKind::ModuleUnavailable, "active app has no text extractor"))
            }
        };

        if !passes_noise_filter(&raw) {
            return Err(HandlerError::new(ErrorKind::ExtractionFailed, "extracted text failed the noise filter"));
        }

        let truncated = truncate_at_word_boundary(&raw, self.content_max_bytes);
        let normalized = normalize_whitespace(truncated);

        let summary = match self.summarize(utterance_text, &normalized).await {
            Ok(summary) => summary,
            Err(err) => {
                warn!(kind = %err.kind, "summarization failed, using extractive fallback");
                fallback_summary(&normalized, 200)
            }
        };

        let elapsed = started.elapsed();
        if elapsed > self.total_budget {
            warn!(?elapsed, budget = ?self.total_budget, "question-answering fast path exceeded its soft SLO");
        }
        Ok(summary)
    }

    /// Run an extraction call under a wall-clock deadline on a worker task
    /// (spec §4.E.2: "do not use signal-based timers, they are unsafe
    /// outside the main thread").
    async fn extract_with_budget<'b, F>(&'b self, attempt: F) -> Result<String, HandlerError>
    where
        F: FnOnce() -> BoxFuture<'b, Result<String, HandlerError>>,
    {
        match tokio::time::timeout(self.extraction_budget, attempt()).await {
            Ok(result) => result,
            Err(_) => Err(HandlerError::new(
                ErrorKind::ExtractionTimeout,
                format!("extraction exceeded its {:?} budget", self.extraction_budget),
            )),
        }
    }

    async fn summarize(&self, utterance_text: &str, content: &str) -> Result<String, HandlerError> {
        let style = summary_style(utterance_text);
        let instruction = match style {
            SummaryStyle::Descriptive => "Write a descriptive summary of the following content.",
            SummaryStyle::Concise => "Write a concise summary of the following content.",
            SummaryStyle::BulletPoints => "List the key points of the following content as a bullet list.",
        };
        let prompt = format!("{instruction}\n\n{content}");

        let reply = match tokio::time::timeout(self.summarize_budget, self.reasoning.complete(&prompt)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(HandlerError::new(
                    ErrorKind::ReasoningTimeout,
                    format!("summarization exceeded its {:?} budget", self.summarize_budget),
                ))
            }
        };
        envelope::extract_text(&reply)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| HandlerError::new(ErrorKind::ContentGenerationEmpty, "summarizer returned no text"))
    }

    async fn slow_path(&self, utterance_text: &str) -> Result<String, HandlerError> {
        self.audio().conversational("Let me take a look.").await;
        let prompt = format!("Describe and analyze what is visible on screen for: {utterance_text}");
        let plan: Value = self.vision.capture_and_analyze(&prompt).await?;
        envelope::extract_text(&plan)
            .or_else(|| plan.get("description").and_then(Value::as_str).map(str::to_owned))
            .ok_or_else(|| HandlerError::new(ErrorKind::ContentGenerationEmpty, "vision produced no description"))
    }
}

impl Handler for QaHandler {
    fn supports(&self, kind: IntentKind) -> bool {
        kind == IntentKind::QuestionAnswering
    }

    fn handle<'a>(&'a self, ctx: HandlerContext<'a>) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let timings = Timings::start();
            let correlation_id = ctx.utterance.id;

            match self.fast_path(&ctx.utterance.text).await {
                Ok(summary) => {
                    self.audio().success(Some(&summary), None).await;
                    HandlerResult::success(Method::FastPath, correlation_id, timings.finish(), summary)
                }
                Err(err) if !err.kind.allows_fallback() => {
                    HandlerResult::error(Method::FastPath, correlation_id, timings.finish(), err.kind)
                }
                Err(err) => {
                    info!(kind = %err.kind, "qa fast path unavailable, falling back to vision");
                    match self.slow_path(&ctx.utterance.text).await {
                        Ok(summary) => {
                            self.audio().success(Some(&summary), None).await;
                            HandlerResult::success(Method::SlowPath, correlation_id, timings.finish(), summary)
                        }
                        Err(err) => HandlerResult::error(Method::SlowPath, correlation_id, timings.finish(), err.kind),
                    }
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "qa_tests.rs"]
mod tests;
