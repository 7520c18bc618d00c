// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The shape every handler returns to the Orchestrator.

use serde::Serialize;
use tokio::time::{Duration, Instant};
use uuid::Uuid;

use crate::error::ErrorKind;

/// Outcome of a single handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    Error,
    /// A deferred action is now armed and awaiting a click. Only the
    /// Deferred Action Handler may return this, and only once the pending
    /// action has been published atomically to its state machine.
    WaitingForUserAction,
}

/// Which execution strategy produced a [`HandlerResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Method {
    FastPath,
    SlowPath,
    Deferred,
    Conversation,
}

/// Timing breakdown recorded alongside a result, for logging and for tests
/// that assert on wall-clock budgets.
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    pub started_at: Instant,
    pub finished_at: Instant,
}

impl Timings {
    pub fn start() -> Self {
        let now = Instant::now();
        Self { started_at: now, finished_at: now }
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Instant::now();
        self
    }

    pub fn elapsed(&self) -> Duration {
        self.finished_at.saturating_duration_since(self.started_at)
    }
}

/// What a handler hands back to the Orchestrator after acting on an intent.
///
/// `timings` is excluded from the wire envelope: `Instant` has no epoch to
/// serialize against, and it's a logging/testing concern, not a payload
/// field a client needs.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResult {
    pub status: Status,
    pub method: Method,
    pub payload: Option<String>,
    pub error: Option<ErrorKind>,
    #[serde(skip)]
    pub timings: Timings,
    pub correlation_id: Uuid,
}

impl HandlerResult {
    pub fn success(method: Method, correlation_id: Uuid, timings: Timings, payload: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            method,
            payload: Some(payload.into()),
            error: None,
            timings,
            correlation_id,
        }
    }

    pub fn error(method: Method, correlation_id: Uuid, timings: Timings, kind: ErrorKind) -> Self {
        Self { status: Status::Error, method, payload: None, error: Some(kind), timings, correlation_id }
    }

    /// Construct a `WAITING_FOR_USER_ACTION` result. Only the Deferred
    /// Action Handler should call this; enforcement of that lives in the
    /// handler, not the type.
    pub fn waiting(correlation_id: Uuid, timings: Timings) -> Self {
        Self {
            status: Status::WaitingForUserAction,
            method: Method::Deferred,
            payload: None,
            error: None,
            timings,
            correlation_id,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
