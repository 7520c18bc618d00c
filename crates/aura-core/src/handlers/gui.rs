// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fast-path (accessibility) and slow-path (vision) execution of GUI
//! commands (spec §4.D).

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::audio::AudioFacade;
use crate::collaborators::{AccessibilityClient, Automation, AudioFeedbackSink, Point, Rect, UiElement, VisionClient};
use crate::error::{ErrorKind, HandlerError};
use crate::handlers::shared::{self, CLICKABLE_ROLES};
use crate::intent::IntentKind;
use crate::registry::{Handler, HandlerContext};
use crate::result::{HandlerResult, Method, Timings};

/// The action verb carried by a GUI intent's parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuiAction {
    Click,
    DoubleClick,
    RightClick,
    Type,
    Scroll,
}

impl GuiAction {
    fn from_param(raw: Option<&str>) -> Self {
        match raw {
            Some("double_click") => Self::DoubleClick,
            Some("right_click") => Self::RightClick,
            Some("type") => Self::Type,
            Some("scroll") => Self::Scroll,
            _ => Self::Click,
        }
    }
}

struct GuiTarget {
    label: String,
    action: GuiAction,
    text: Option<String>,
    scroll_dx: i32,
    scroll_dy: i32,
}

fn parse_target(ctx: &HandlerContext<'_>) -> Option<GuiTarget> {
    let label = ctx.intent.parameters.get("label")?.as_str()?.to_owned();
    let action = GuiAction::from_param(ctx.intent.parameters.get("action").and_then(Value::as_str));
    let text = ctx.intent.parameters.get("text").and_then(Value::as_str).map(str::to_owned);
    let scroll_dx = ctx.intent.parameters.get("scroll_dx").and_then(Value::as_i64).unwrap_or(0) as i32;
    let scroll_dy = ctx.intent.parameters.get("scroll_dy").and_then(Value::as_i64).unwrap_or(120) as i32;
    Some(GuiTarget { label, action, text, scroll_dx, scroll_dy })
}

fn is_exact_match(element: &UiElement, label: &str) -> bool {
    element.label.trim().eq_ignore_ascii_case(label.trim())
}

fn area(rect: &Rect) -> u64 {
    rect.width as u64 * rect.height as u64
}

/// Pick the best candidate: exact-title match, then enabled, then larger
/// bounding box (spec §4.D.4).
fn pick_best<'a>(candidates: &'a [UiElement], label: &str) -> Option<&'a UiElement> {
    candidates.iter().max_by(|a, b| {
        let a_key = (is_exact_match(a, label), a.enabled, area(&a.bounds));
        let b_key = (is_exact_match(b, label), b.enabled, area(&b.bounds));
        a_key.cmp(&b_key)
    })
}

fn matches_label(element: &UiElement, label: &str, fuzzy_threshold: u8) -> bool {
    if is_exact_match(element, label) {
        return true;
    }
    shared::label_similarity(&element.label, label) >= fuzzy_threshold
}

fn center(rect: &Rect) -> Point {
    Point { x: rect.x + rect.width as i32 / 2, y: rect.y + rect.height as i32 / 2 }
}

/// Executes GUI commands: accessibility fast path first, vision slow path
/// on failure.
///
/// Collaborators are held as `Arc<dyn Trait>` rather than borrowed
/// references (unlike the original split where only the Deferred Handler
/// needed this) so the handler itself can be `'static` and live inside the
/// [`crate::registry::Registry`] for the lifetime of the Orchestrator,
/// grounded on the same reasoning as `handlers::deferred::handler`.
pub struct GuiHandler {
    accessibility: Arc<dyn AccessibilityClient>,
    automation: Arc<dyn Automation>,
    vision: Arc<dyn VisionClient>,
    audio_sink: Arc<dyn AudioFeedbackSink>,
    default_app: String,
    fuzzy_match_threshold: u8,
    fast_path_retry_max: u32,
    backoff_base: tokio::time::Duration,
}

impl GuiHandler {
    pub fn new(
        accessibility: Arc<dyn AccessibilityClient>,
        automation: Arc<dyn Automation>,
        vision: Arc<dyn VisionClient>,
        audio_sink: Arc<dyn AudioFeedbackSink>,
        default_app: impl Into<String>,
        fuzzy_match_threshold: u8,
        fast_path_retry_max: u32,
        backoff_base: tokio::time::Duration,
    ) -> Self {
        Self {
            accessibility,
            automation,
            vision,
            audio_sink,
            default_app: default_app.into(),
            fuzzy_match_threshold,
            fast_path_retry_max,
            backoff_base,
        }
    }

    fn audio(&self) -> AudioFacade<'_> {
        AudioFacade::new(self.audio_sink.as_ref())
    }

    async fn fast_path(&self, target: &GuiTarget) -> Result<(), HandlerError> {
        let app = shared::detect_active_app(self.accessibility.as_ref(), &self.default_app).await?;
        info!(app, label = target.label, "resolved active app for fast path");

        shared::retry_with_backoff(self.fast_path_retry_max, self.backoff_base, || async {
            let elements = self.accessibility.list_elements().await?;
            let candidates: Vec<UiElement> = elements
                .into_iter()
                .filter(|el| CLICKABLE_ROLES.contains(&el.role.as_str()))
                .filter(|el| matches_label(el, &target.label, self.fuzzy_match_threshold))
                .collect();

            let Some(best) = pick_best(&candidates, &target.label) else {
                return Err(HandlerError::new(
                    ErrorKind::ElementNotFound,
                    format!("no clickable element matched label '{}'", target.label),
                ));
            };

            self.dispatch(target, center(&best.bounds)).await
        })
        .await
    }

    async fn dispatch(&self, target: &GuiTarget, point: Point) -> Result<(), HandlerError> {
        match target.action {
            GuiAction::Click | GuiAction::DoubleClick | GuiAction::RightClick => {
                self.automation.click(point).await
            }
            GuiAction::Type => {
                self.automation.click(point).await?;
                let text = target.text.as_deref().unwrap_or_default();
                self.automation.type_text(text).await
            }
            GuiAction::Scroll => self.scroll_with_refinement(point, target.scroll_dx, target.scroll_dy).await,
        }
    }

    /// Establish focus at `point`, wait for it to settle, then scroll.
    /// On failure, retries with doubled then halved magnitude, and
    /// finally with the alternate axis (spec §4.D "Scroll refinement").
    async fn scroll_with_refinement(&self, point: Point, dx: i32, dy: i32) -> Result<(), HandlerError> {
        self.automation.click(point).await?;
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        let attempts: [(i32, i32); 4] = [(dx, dy), (dx * 2, dy * 2), (dx / 2, dy / 2), (dy, dx)];
        let mut last_error = None;
        for (attempt_dx, attempt_dy) in attempts {
            match self.automation.scroll(point, attempt_dx, attempt_dy).await {
                Ok(()) => return Ok(()),
                Err(err) => last_error = Some(err),
            }
        }
        Err(last_error.unwrap_or_else(|| HandlerError::new(ErrorKind::InternalError, "scroll produced no attempts")))
    }

    async fn slow_path(&self, target: &GuiTarget) -> Result<(), HandlerError> {
        self.audio().conversational("Let me take a closer look.").await;

        let prompt = format!("Locate and {:?} the element described as: {}", target.action, target.label);
        let plan = self.vision.capture_and_analyze(&prompt).await?;
        self.execute_plan(target, &plan).await
    }

    async fn execute_plan(&self, target: &GuiTarget, plan: &Value) -> Result<(), HandlerError> {
        let steps = plan.get("steps").and_then(Value::as_array).cloned().unwrap_or_default();
        if steps.is_empty() {
            return Err(HandlerError::new(ErrorKind::ElementNotFound, "vision plan had no steps"));
        }

        for step in &steps {
            let x = step.get("coordinates").and_then(|c| c.get("x")).and_then(Value::as_i64);
            let y = step.get("coordinates").and_then(|c| c.get("y")).and_then(Value::as_i64);
            let (Some(x), Some(y)) = (x, y) else {
                return Err(HandlerError::new(ErrorKind::InvalidCoordinates, "vision step missing coordinates"));
            };
            let point = Point { x: x as i32, y: y as i32 };
            self.dispatch(target, point).await?;
        }
        Ok(())
    }
}

impl Handler for GuiHandler {
    fn supports(&self, kind: IntentKind) -> bool {
        kind == IntentKind::GuiInteraction
    }

    fn handle<'a>(
        &'a self,
        ctx: HandlerContext<'a>,
    ) -> crate::collaborators::BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let timings = Timings::start();
            let correlation_id = ctx.utterance.id;

            let Some(target) = parse_target(&ctx) else {
                warn!("GUI intent missing a label, skipping straight to vision");
                let fallback_target =
                    GuiTarget { label: String::new(), action: GuiAction::Click, text: None, scroll_dx: 0, scroll_dy: 0 };
                return match self.slow_path(&fallback_target).await {
                    Ok(()) => HandlerResult::success(Method::SlowPath, correlation_id, timings.finish(), "done"),
                    Err(err) => HandlerResult::error(Method::SlowPath, correlation_id, timings.finish(), err.kind),
                };
            };

            match self.fast_path(&target).await {
                Ok(()) => HandlerResult::success(Method::FastPath, correlation_id, timings.finish(), "done"),
                Err(err) if !err.kind.allows_fallback() => {
                    HandlerResult::error(Method::FastPath, correlation_id, timings.finish(), err.kind)
                }
                Err(err) => {
                    warn!(kind = %err.kind, "fast path exhausted, escalating to vision");
                    match self.slow_path(&target).await {
                        Ok(()) => HandlerResult::success(Method::SlowPath, correlation_id, timings.finish(), "done"),
                        Err(err) => HandlerResult::error(Method::SlowPath, correlation_id, timings.finish(), err.kind),
                    }
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "gui_tests.rs"]
mod tests;
