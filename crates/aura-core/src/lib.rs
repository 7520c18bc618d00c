// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AURA Orchestrator Core: the central command scheduler behind a
//! voice-activated desktop automation assistant.
//!
//! The entry point is [`orchestrator::Orchestrator`]: it classifies an
//! [`utterance::Utterance`] into an [`intent::Intent`], routes it to the one
//! [`registry::Handler`] registered for that [`intent::IntentKind`], and
//! returns a [`result::HandlerResult`]. See [`orchestrator`] for the full
//! dataflow.

pub mod audio;
pub mod collaborators;
pub mod concurrency;
pub mod config;
pub mod envelope;
pub mod error;
pub mod fallback_chain;
pub mod handlers;
pub mod intent;
pub mod orchestrator;
pub mod postprocess;
pub mod registry;
pub mod result;
pub mod utterance;

pub use config::Config;
pub use error::{ErrorKind, HandlerError};
pub use intent::{Intent, IntentKind};
pub use orchestrator::Orchestrator;
pub use registry::{Handler, HandlerContext, Registry};
pub use result::{HandlerResult, Method, Status};
pub use utterance::Utterance;
