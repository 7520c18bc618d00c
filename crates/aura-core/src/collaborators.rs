// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capability traits for every external system the Orchestrator Core leans
//! on: a reasoning model, a vision model, OS accessibility, a browser's DOM,
//! a PDF viewer, UI automation, mouse capture, audio playback, and the
//! clock. Each is implemented by the embedding host process; this crate only
//! defines the seam.
//!
//! Every trait here is object-safe: async methods return a boxed, pinned
//! future directly rather than pulling in `async-trait`.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use uuid::Uuid;

use crate::error::HandlerError;

/// Shorthand for the boxed future every collaborator method returns.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A rectangular region of the screen, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// A point on the screen, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// An accessibility element discovered on screen: a role, a label, and the
/// bounds the Automation collaborator can click.
#[derive(Debug, Clone, PartialEq)]
pub struct UiElement {
    pub role: String,
    pub label: String,
    pub bounds: Rect,
    pub enabled: bool,
}

/// Sends a structured prompt to a large language model and returns its raw
/// JSON (or string) reply, in whichever shape that model's API uses —
/// [`crate::envelope`] normalizes the shape afterward.
pub trait ReasoningClient: Send + Sync {
    fn complete(&self, prompt: &str) -> BoxFuture<'_, Result<Value, HandlerError>>;
}

/// Captures the screen and asks a vision-capable model to produce an
/// action plan or description for `prompt`. The collaborator owns capture;
/// the core never handles raw image bytes.
pub trait VisionClient: Send + Sync {
    fn capture_and_analyze(&self, prompt: &str) -> BoxFuture<'_, Result<Value, HandlerError>>;
}

/// Queries the OS accessibility tree for the frontmost application.
pub trait AccessibilityClient: Send + Sync {
    fn frontmost_app(&self) -> BoxFuture<'_, Result<String, HandlerError>>;

    fn find_element(&self, label: &str) -> BoxFuture<'_, Result<Option<UiElement>, HandlerError>>;

    fn list_elements(&self) -> BoxFuture<'_, Result<Vec<UiElement>, HandlerError>>;
}

/// Extracts visible text from the frontmost browser tab's DOM.
pub trait BrowserExtractor: Send + Sync {
    fn extract_visible_text(&self) -> BoxFuture<'_, Result<String, HandlerError>>;
}

/// Extracts visible text from the frontmost PDF viewer.
pub trait PdfExtractor: Send + Sync {
    fn extract_visible_text(&self) -> BoxFuture<'_, Result<String, HandlerError>>;
}

/// Drives OS-level UI automation: clicks, typing, and clipboard paste.
pub trait Automation: Send + Sync {
    fn click(&self, point: Point) -> BoxFuture<'_, Result<(), HandlerError>>;

    fn type_text(&self, text: &str) -> BoxFuture<'_, Result<(), HandlerError>>;

    fn paste_text(&self, text: &str) -> BoxFuture<'_, Result<(), HandlerError>>;

    fn scroll(&self, point: Point, dx: i32, dy: i32) -> BoxFuture<'_, Result<(), HandlerError>>;
}

/// Subscribes to mouse-click events for the deferred-action click watcher.
/// `token` identifies the subscription (the armed `DeferredPending`'s id),
/// so a preempted or timed-out wait can be released deterministically
/// rather than relying on the subscriber task simply being dropped (spec
/// §4.G.6, §6 `subscribe_single_click(token)` / `cancel(token)`).
pub trait MouseCapture: Send + Sync {
    fn subscribe_single_click(&self, token: Uuid) -> BoxFuture<'_, Option<Point>>;

    /// Release the subscription identified by `token` without waiting for
    /// a click. Called when the pending it was armed for is preempted or
    /// times out.
    fn cancel(&self, token: Uuid);
}

/// Priority used when queuing an audio cue; higher-priority cues preempt
/// lower ones already queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AudioPriority {
    Low,
    Normal,
    High,
}

/// Plays sound effects and synthesized speech back to the user.
pub trait AudioFeedbackSink: Send + Sync {
    fn play_sound(&self, sound_id: &str, priority: AudioPriority) -> BoxFuture<'_, Result<(), HandlerError>>;

    fn speak(&self, text: &str, priority: AudioPriority) -> BoxFuture<'_, Result<(), HandlerError>>;
}

#[cfg(test)]
#[path = "collaborators_tests.rs"]
mod tests;
