// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A thin façade over [`crate::collaborators::AudioFeedbackSink`] composing
//! a sound effect with an optional spoken message (spec §4.J).

use tracing::warn;

use crate::collaborators::{AudioFeedbackSink, AudioPriority};
use crate::postprocess::ContentType;

/// Fixed catalog of sound effects the façade can compose with speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    Thinking,
    Success,
    Failure,
    Alert,
}

impl Sound {
    fn cue(&self) -> &'static str {
        match self {
            Self::Thinking => "sfx:thinking",
            Self::Success => "sfx:success",
            Self::Failure => "sfx:failure",
            Self::Alert => "sfx:alert",
        }
    }
}

/// Speaks and plays feedback to the user. Every method is infallible to the
/// caller: if the underlying TTS fails, the sound effect still plays and
/// the method returns normally (spec §4.J, §7 "never leave the user with
/// silent failure").
pub struct AudioFacade<'a> {
    sink: &'a dyn AudioFeedbackSink,
}

impl<'a> AudioFacade<'a> {
    pub fn new(sink: &'a dyn AudioFeedbackSink) -> Self {
        Self { sink }
    }

    pub async fn conversational(&self, message: &str) {
        self.play(Sound::Thinking, Some(message), AudioPriority::Normal).await;
    }

    pub async fn deferred_instructions(&self, content_type: ContentType) {
        let message = match content_type {
            ContentType::Code => "Code generated. Click where you want it placed.",
            ContentType::Text => "Content generated. Click where you want it placed.",
        };
        self.play(Sound::Success, Some(message), AudioPriority::Normal).await;
    }

    pub async fn deferred_completion(&self, success: bool, content_type: ContentType) {
        let noun = match content_type {
            ContentType::Code => "code",
            ContentType::Text => "text",
        };
        if success {
            let message = format!("Placed the {noun}.");
            self.play(Sound::Success, Some(&message), AudioPriority::Normal).await;
        } else {
            let message = format!("Could not place the {noun}.");
            self.play(Sound::Failure, Some(&message), AudioPriority::High).await;
        }
    }

    pub async fn deferred_timeout(&self, elapsed: std::time::Duration) {
        let message = format!("No placement received after {} seconds, canceling.", elapsed.as_secs());
        self.play(Sound::Alert, Some(&message), AudioPriority::High).await;
    }

    pub async fn enhanced_error(&self, message: &str, context: &str) {
        let full = format!("{message} ({context})");
        self.play(Sound::Failure, Some(&full), AudioPriority::High).await;
    }

    pub async fn success(&self, message: Option<&str>, context: Option<&str>) {
        let spoken = match (message, context) {
            (Some(m), Some(c)) => Some(format!("{m} ({c})")),
            (Some(m), None) => Some(m.to_owned()),
            (None, Some(c)) => Some(c.to_owned()),
            (None, None) => None,
        };
        self.play(Sound::Success, spoken.as_deref(), AudioPriority::Low).await;
    }

    async fn play(&self, sound: Sound, message: Option<&str>, priority: AudioPriority) {
        if let Err(err) = self.sink.play_sound(sound.cue(), priority).await {
            warn!(kind = %err.kind, "sound effect failed to play");
        }
        if let Some(text) = message {
            if let Err(err) = self.sink.speak(text, priority).await {
                warn!(kind = %err.kind, "speech synthesis failed, sound effect alone stands");
            }
        }
    }
}

#[cfg(test)]
#[path = "audio_tests.rs"]
mod tests;
