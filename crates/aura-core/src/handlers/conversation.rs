// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Free-form chat, backed by the reasoning collaborator and a bounded
//! rolling history (spec §4.F).

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;

use crate::audio::AudioFacade;
use crate::collaborators::{AudioFeedbackSink, BoxFuture, ReasoningClient};
use crate::envelope;
use crate::intent::IntentKind;
use crate::registry::{Handler, HandlerContext};
use crate::result::{HandlerResult, Method, Timings};

const PERSONA_PROMPT: &str =
    "You are AURA, a helpful voice assistant. Reply conversationally and concisely.";

const APOLOGETIC_FALLBACK: &str = "Sorry, I couldn't come up with a reply just now.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
struct Turn {
    role: Role,
    text: String,
}

/// Rolling chat history, evicted to `max_turns` after each completed turn.
struct History {
    turns: Vec<Turn>,
    max_turns: usize,
}

impl History {
    fn new(max_turns: usize) -> Self {
        Self { turns: Vec::new(), max_turns }
    }

    fn push(&mut self, role: Role, text: String) {
        self.turns.push(Turn { role, text });
        while self.turns.len() > self.max_turns {
            self.turns.remove(0);
        }
    }

    fn render(&self) -> String {
        let mut rendered = String::from(PERSONA_PROMPT);
        for turn in &self.turns {
            let label = match turn.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            rendered.push_str(&format!("\n{label}: {}", turn.text));
        }
        rendered
    }
}

/// Handles `CONVERSATIONAL_CHAT` intents, maintaining a single-writer
/// bounded history (spec §5 "Conversation history: single-writer under the
/// Conversation Handler").
pub struct ConversationHandler {
    reasoning: Arc<dyn ReasoningClient>,
    audio_sink: Arc<dyn AudioFeedbackSink>,
    history: Mutex<History>,
}

impl ConversationHandler {
    pub fn new(reasoning: Arc<dyn ReasoningClient>, audio_sink: Arc<dyn AudioFeedbackSink>, history_max: usize) -> Self {
        Self { reasoning, audio_sink, history: Mutex::new(History::new(history_max)) }
    }

    fn audio(&self) -> AudioFacade<'_> {
        AudioFacade::new(self.audio_sink.as_ref())
    }

    async fn reply(&self, utterance_text: &str) -> String {
        // Atomic per turn: append user turn, await response, append
        // assistant turn, evict. The lock is released across the reasoning
        // call itself (never held across an external RPC, per spec §5
        // deadlock avoidance) and re-acquired only to record each turn.
        let mut history = self.history.lock().await;
        history.push(Role::User, utterance_text.to_owned());
        let prompt = history.render();
        drop(history);

        let reply_text = match self.reasoning.complete(&prompt).await {
            Ok(envelope) => envelope::extract_text(&envelope)
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| APOLOGETIC_FALLBACK.to_owned()),
            Err(err) => {
                warn!(kind = %err.kind, "conversation reply failed, using apologetic fallback");
                APOLOGETIC_FALLBACK.to_owned()
            }
        };

        let mut history = self.history.lock().await;
        history.push(Role::Assistant, reply_text.clone());
        reply_text
    }
}

impl Handler for ConversationHandler {
    fn supports(&self, kind: IntentKind) -> bool {
        kind == IntentKind::ConversationalChat
    }

    fn handle<'a>(&'a self, ctx: HandlerContext<'a>) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let timings = Timings::start();
            let correlation_id = ctx.utterance.id;

            let reply_text = self.reply(&ctx.utterance.text).await;
            self.audio().conversational(&reply_text).await;

            HandlerResult::success(Method::Conversation, correlation_id, timings.finish(), reply_text)
        })
    }
}

#[cfg(test)]
#[path = "conversation_tests.rs"]
mod tests;
