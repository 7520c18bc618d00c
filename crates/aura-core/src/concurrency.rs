// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The two named locks that keep the Orchestrator from doing two things to
//! the screen, or two reasoning calls, at once.
//!
//! A `tokio::sync::Mutex` wrapped so that acquisition is bounded by a
//! timeout and release happens on drop, with no possibility of forgetting
//! to release.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Duration;

use crate::error::{ErrorKind, HandlerError};

/// A named, timeout-bounded mutex. The Execution Lock guards screen/UI
/// automation; the Intent Lock guards the reasoning collaborator used for
/// intent classification. Both are instances of this same primitive.
pub struct NamedLock {
    name: &'static str,
    inner: Mutex<()>,
}

impl NamedLock {
    pub fn new(name: &'static str) -> Self {
        Self { name, inner: Mutex::new(()) }
    }

    /// Acquire the lock, waiting up to `timeout`. Returns
    /// [`ErrorKind::LockTimeout`] if the lock is not free in time.
    pub async fn try_acquire(&self, timeout: Duration) -> Result<LockGuard<'_>, HandlerError> {
        match tokio::time::timeout(timeout, self.inner.lock()).await {
            Ok(guard) => Ok(LockGuard { name: self.name, inner: guard }),
            Err(_) => Err(HandlerError::new(
                ErrorKind::LockTimeout,
                format!("timed out acquiring {} lock after {:?}", self.name, timeout),
            )),
        }
    }
}

/// RAII guard for a [`NamedLock`]. Dropping it releases the lock; callers
/// that need to release before the end of scope (the Execution Lock's
/// early-release-on-WAITING semantics) call [`LockGuard::release`]
/// explicitly instead of holding it past that point.
pub struct LockGuard<'a> {
    name: &'static str,
    inner: MutexGuard<'a, ()>,
}

impl LockGuard<'_> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Release the lock now rather than at end of scope.
    pub fn release(self) {
        drop(self);
    }
}

/// The pair of locks the Orchestrator holds during a single utterance's
/// handling. `execution` is `Arc`-held because the Deferred Action Handler
/// must re-acquire the very same lock from a background task, long after
/// the call that armed it has returned.
pub struct Locks {
    pub execution: Arc<NamedLock>,
    pub intent: NamedLock,
}

impl Locks {
    pub fn new() -> Self {
        Self { execution: Arc::new(NamedLock::new("execution")), intent: NamedLock::new("intent") }
    }
}

impl Default for Locks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "concurrency_tests.rs"]
mod tests;
