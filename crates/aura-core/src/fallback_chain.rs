// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generic tiered fallback resolution.
//!
//! Both the GUI Handler's accessibility-then-vision app-detection chain
//! (spec §4.D.2) and the Fast-Path-to-Slow-Path escalation (spec §4.D.5,
//! §7) are the same shape: try tier 0, and only move to tier 1 if tier 0's
//! failure is the kind of failure that's allowed to escalate. Grounded on
//! the teacher's `driver::composite::CompositeDetector`, whose tier
//! resolution is escalation-only — a lower-confidence tier may raise the
//! result but a higher one is never silently overridden by a worse result.
//! Here "escalation" is sequential (call the next tier) rather than
//! concurrent (accept its stream), since collaborators are invoked on
//! demand, not run continuously.

use tracing::debug;

use crate::collaborators::BoxFuture;
use crate::error::HandlerError;

/// One attempt in a fallback chain: a human-readable name (for logging) and
/// the future producing its result.
pub struct Tier<'a, T> {
    pub name: &'static str,
    pub attempt: BoxFuture<'a, Result<T, HandlerError>>,
}

impl<'a, T> Tier<'a, T> {
    pub fn new(name: &'static str, attempt: BoxFuture<'a, Result<T, HandlerError>>) -> Self {
        Self { name, attempt }
    }
}

/// Run `tiers` in order, returning the first success. Stops early (without
/// trying later tiers) the first time a tier fails with an error that does
/// not [`HandlerError::kind`]'s [`crate::error::ErrorKind::allows_fallback`]
/// (spec §8: `PermissionDenied` is reported directly, never escalated).
///
/// Returns the last error seen if every tier fails.
pub async fn resolve<T>(tiers: Vec<Tier<'_, T>>) -> Result<T, HandlerError> {
    let mut last_error: Option<HandlerError> = None;

    for tier in tiers {
        match tier.attempt.await {
            Ok(value) => return Ok(value),
            Err(err) => {
                debug!(tier = tier.name, kind = %err.kind, "fallback tier failed");
                let can_continue = err.kind.allows_fallback();
                last_error = Some(err);
                if !can_continue {
                    break;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        HandlerError::new(crate::error::ErrorKind::InternalError, "fallback chain had no tiers")
    }))
}

#[cfg(test)]
#[path = "fallback_chain_tests.rs"]
mod tests;
