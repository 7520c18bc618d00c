// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Deferred Action state machine: `IDLE -> PREPARING -> WAITING ->
//! EXECUTING -> (IDLE|FAILED)` (spec §3 Data Model, §4.G, §9).
//!
//! REDESIGN FLAGS (spec.md §9): global mutable state scattered across
//! booleans, coordinates, and content strings becomes a single owned
//! `DeferredPending` slot behind an atomic-style compare-and-swap guard.
//! Grounded on the teacher's `replay_gate::ReplayGate`, which gates
//! concurrent updates against a single authoritative high-water mark behind
//! one lock rather than scattering flags — here the mark is a `DeferredState`
//! instead of a byte offset, and the guard is `tokio::sync::Mutex` because
//! the click watcher and timeout watcher race from separate tasks (the
//! teacher's gate is single-owner, mutated with `&mut self`).

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use uuid::Uuid;

use crate::postprocess::ContentType;

/// Current phase of the deferred-action state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredState {
    Idle,
    Preparing,
    Waiting,
    Executing,
    Failed,
}

/// The single armed record awaiting a click (spec GLOSSARY: "Pending").
/// `id` uniquely identifies this armed instance so a claim racing in from a
/// preempted or timed-out task can be told apart from the pending currently
/// in the slot (spec §3, §4.G.5, §4.G.6: the `WAITING -> EXECUTING` and
/// `WAITING -> FAILED` CAS are keyed by the pending's id).
#[derive(Debug, Clone)]
pub struct DeferredPending {
    pub id: Uuid,
    pub content: String,
    pub content_type: ContentType,
    pub armed_at: Instant,
    pub timeout: Duration,
}

impl DeferredPending {
    pub fn new(id: Uuid, content: String, content_type: ContentType, timeout: Duration) -> Self {
        Self { id, content, content_type, armed_at: Instant::now(), timeout }
    }

    pub fn elapsed(&self) -> Duration {
        self.armed_at.elapsed()
    }
}

struct Inner {
    state: DeferredState,
    pending: Option<DeferredPending>,
}

/// Guards the one deferred-pending slot with explicit CAS-style
/// transitions. Every transition checks the current state before mutating,
/// so a click and a timeout racing for the same pending can only ever have
/// one winner (spec §5 "Mouse-subscription wait").
pub struct DeferredSlot {
    inner: Mutex<Inner>,
}

impl DeferredSlot {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner { state: DeferredState::Idle, pending: None }) }
    }

    pub async fn state(&self) -> DeferredState {
        self.inner.lock().await.state
    }

    /// `IDLE -> PREPARING`. If a previous action is still `WAITING`, it is
    /// preempted first: the spec's resolved Open Question is that a new
    /// deferred request while `WAITING` cancels the previous one (with
    /// canceled audio) rather than being rejected. Returns the preempted
    /// pending, if any, so the caller can play cancellation audio for it.
    pub async fn begin_preparing(&self) -> Option<DeferredPending> {
        let mut inner = self.inner.lock().await;
        let preempted = if inner.state == DeferredState::Waiting { inner.pending.take() } else { None };
        inner.state = DeferredState::Preparing;
        preempted
    }

    /// `PREPARING -> WAITING`, publishing `pending` atomically.
    pub async fn arm(&self, pending: DeferredPending) {
        let mut inner = self.inner.lock().await;
        inner.state = DeferredState::Waiting;
        inner.pending = Some(pending);
    }

    /// Attempt to claim the pending slot for execution in response to a
    /// click. Succeeds only if the state is still `WAITING` and the slot's
    /// current pending is still the one identified by `expected_id` — `CAS
    /// WAITING -> EXECUTING`, keyed by id so a stale race task left running
    /// after a preemption can't claim a pending that isn't its own. A
    /// second click after the first has already claimed it (or after a
    /// timeout has cleared it) is a no-op (spec §8 scenario 5: "duplicate
    /// click events are no-ops").
    pub async fn claim_for_click(&self, expected_id: Uuid) -> Option<DeferredPending> {
        let mut inner = self.inner.lock().await;
        if inner.state != DeferredState::Waiting || inner.pending.as_ref().map(|p| p.id) != Some(expected_id) {
            return None;
        }
        inner.state = DeferredState::Executing;
        inner.pending.take()
    }

    /// Attempt to claim the pending slot for the timeout path. Succeeds
    /// only if still `WAITING` and the slot's pending still matches
    /// `expected_id` — `CAS WAITING -> IDLE`, keyed by id for the same
    /// reason as `claim_for_click`, clearing the slot directly since a
    /// timeout has no placement to execute.
    pub async fn claim_for_timeout(&self, expected_id: Uuid) -> Option<DeferredPending> {
        let mut inner = self.inner.lock().await;
        if inner.state != DeferredState::Waiting || inner.pending.as_ref().map(|p| p.id) != Some(expected_id) {
            return None;
        }
        inner.state = DeferredState::Idle;
        inner.pending.take()
    }

    /// `EXECUTING -> IDLE` (or `-> FAILED -> IDLE` on failure), clearing the
    /// slot. Idempotent: calling this when already `IDLE` is a no-op (spec
    /// §8 round-trip law).
    pub async fn complete(&self, success: bool) {
        let mut inner = self.inner.lock().await;
        if inner.state != DeferredState::Executing {
            return;
        }
        inner.state = if success { DeferredState::Idle } else { DeferredState::Failed };
        inner.pending = None;
        if inner.state == DeferredState::Failed {
            inner.state = DeferredState::Idle;
        }
    }

    /// Cancel a `WAITING` pending outright (used by `begin_preparing`'s
    /// preemption and available for explicit cancellation). A no-op when
    /// already `IDLE`.
    pub async fn cancel(&self) -> Option<DeferredPending> {
        let mut inner = self.inner.lock().await;
        if inner.state != DeferredState::Waiting {
            return None;
        }
        inner.state = DeferredState::Idle;
        inner.pending.take()
    }
}

impl Default for DeferredSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
