// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The immutable record a single voice command is built from.

use tokio::time::Instant;
use uuid::Uuid;

/// A transcribed utterance, carrying the correlation id threaded through
/// every log line and every [`crate::result::HandlerResult`] produced while
/// handling it.
#[derive(Debug, Clone)]
pub struct Utterance {
    pub id: Uuid,
    pub text: String,
    pub received_at: Instant,
}

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4(), text: text.into(), received_at: Instant::now() }
    }
}
