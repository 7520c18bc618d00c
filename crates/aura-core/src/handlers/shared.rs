// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Free functions shared by the GUI and Question-Answering handlers.
//!
//! REDESIGN FLAGS (spec.md §9): "inheritance of handlers reduces to an
//! interface with four concrete implementations; shared helpers live in
//! free functions or a non-polymorphic support struct" — this module is
//! that support surface, grounded on the teacher's `CredentialBroker`
//! retry/backoff shape (`refresh_with_retries`).

use tokio::time::Duration;
use tracing::debug;

use crate::collaborators::AccessibilityClient;
use crate::error::HandlerError;
use crate::fallback_chain::{self, Tier};

/// The extended clickable accessibility role set (spec §4.D.3): the
/// minimum a host must recognize as clickable. Per-app refinements (e.g.
/// browser-engine-specific role mapping) are left to host configuration.
pub const CLICKABLE_ROLES: &[&str] = &[
    "AXButton",
    "AXMenuButton",
    "AXMenuItem",
    "AXMenuBarItem",
    "AXLink",
    "AXCheckBox",
    "AXRadioButton",
    "AXTab",
    "AXToolbarButton",
    "AXPopUpButton",
    "AXComboBox",
];

/// Resolve the active application through the detection fallback chain:
/// the accessibility collaborator's live query first, falling back to a
/// host-configured default if that query fails (spec §4.D.2's native →
/// AppleScript → window-title → process-list → configured-default chain,
/// collapsed to the two tiers this crate's collaborator seam exposes —
/// richer per-platform tiers are the host's concern, layered behind the
/// same [`AccessibilityClient`] implementation).
pub async fn detect_active_app(
    accessibility: &dyn AccessibilityClient,
    configured_default: &str,
) -> Result<String, HandlerError> {
    let default = configured_default.to_owned();
    let tiers = vec![
        Tier::new("accessibility_frontmost", accessibility.frontmost_app()),
        Tier::new("configured_default", Box::pin(async move { Ok(default) })),
    ];
    fallback_chain::resolve(tiers).await
}

/// Retry `attempt` up to `max_retries` additional times on a retryable
/// error, with exponential backoff starting at `base` (spec §4.D.5).
/// Non-retryable errors (and retry exhaustion) return immediately.
pub async fn retry_with_backoff<F, Fut, T>(
    max_retries: u32,
    base: Duration,
    mut attempt: F,
) -> Result<T, HandlerError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, HandlerError>>,
{
    let mut delay = base;
    let mut try_index = 0;

    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.kind.retryable() || try_index == max_retries {
                    return Err(err);
                }
                debug!(kind = %err.kind, attempt = try_index, "retrying after backoff");
                tokio::time::sleep(delay).await;
                delay *= 2;
                try_index += 1;
            }
        }
    }
}

/// Best-effort similarity score (0-100) between two labels, used for fuzzy
/// matching when no exact, case-insensitive, trimmed match exists (spec
/// §4.D.3). Grounded on the `strsim` normalized Levenshtein distance.
pub fn label_similarity(a: &str, b: &str) -> u8 {
    let score = strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase());
    (score * 100.0).round() as u8
}

#[cfg(test)]
#[path = "shared_tests.rs"]
mod tests;
