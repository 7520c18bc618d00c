// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Handler interface and the registry that maps an [`IntentKind`] to
//! exactly one handler (spec §4.C).

use std::collections::HashMap;

use crate::collaborators::BoxFuture;
use crate::error::{ErrorKind, HandlerError};
use crate::intent::{Intent, IntentKind};
use crate::result::HandlerResult;
use crate::utterance::Utterance;

/// What a handler needs to act on a recognized intent.
pub struct HandlerContext<'a> {
    pub utterance: &'a Utterance,
    pub intent: &'a Intent,
}

/// A capability set every intent handler implements. Grounded on the same
/// object-safe, boxed-future shape as [`crate::collaborators`]'s traits, so
/// a handler can itself hold collaborator trait objects without the
/// Registry needing to know their concrete types.
pub trait Handler: Send + Sync {
    fn supports(&self, kind: IntentKind) -> bool;

    fn handle<'a>(&'a self, ctx: HandlerContext<'a>) -> BoxFuture<'a, HandlerResult>;
}

/// Maps exactly one handler to each [`IntentKind`]. Selection is
/// deterministic; the core never falls back to a different intent
/// silently — the only fallback path is the GUI handler's internal
/// vision escalation (spec §4.D).
#[derive(Default)]
pub struct Registry {
    handlers: HashMap<IntentKind, Box<dyn Handler>>,
}

impl Registry {
    pub fn new() -> Self {
        Self { handlers: HashMap::new() }
    }

    pub fn register(&mut self, kind: IntentKind, handler: Box<dyn Handler>) {
        self.handlers.insert(kind, handler);
    }

    /// Select the handler registered for `intent.kind`. Absence of a
    /// registered handler is an [`ErrorKind::InternalError`] (spec §4.C) —
    /// it indicates misconfiguration, not a recoverable runtime condition.
    pub fn select(&self, intent: &Intent) -> Result<&dyn Handler, HandlerError> {
        self.handlers
            .get(&intent.kind)
            .map(|handler| handler.as_ref())
            .ok_or_else(|| {
                HandlerError::new(
                    ErrorKind::InternalError,
                    format!("no handler registered for intent {}", intent.kind.as_str()),
                )
                .not_recoverable()
            })
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
