// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single parser for every shape a reasoning-collaborator reply can take:
//! a bare string, `{"text": ...}`, `{"content": [...]}` blocks, or a nested
//! envelope wrapping one of those. Every caller goes through this one
//! function instead of probing the shape itself at each call site.

use serde_json::Value;

/// Extract the first non-empty textual payload from a reasoning-collaborator
/// reply, trying each known shape in order:
///
/// 1. OpenAI-style: `choices[0].message.content`
/// 2. Direct message: `message`
/// 3. Direct response: `response`
/// 4. Raw string (the whole envelope, if it's already a JSON string)
pub fn extract_text(envelope: &Value) -> Option<String> {
    if let Some(text) = envelope
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|v| v.as_str())
    {
        if !text.is_empty() {
            return Some(text.to_owned());
        }
    }

    if let Some(text) = envelope.get("message").and_then(|v| v.as_str()) {
        if !text.is_empty() {
            return Some(text.to_owned());
        }
    }

    if let Some(text) = envelope.get("response").and_then(|v| v.as_str()) {
        if !text.is_empty() {
            return Some(text.to_owned());
        }
    }

    if let Some(text) = envelope.as_str() {
        if !text.is_empty() {
            return Some(text.to_owned());
        }
    }

    None
}

/// Lenient scan for the first balanced top-level JSON object in free text.
///
/// Reasoning collaborators are asked to reply with pure JSON but sometimes
/// wrap it in prose or markdown fences; this walks brace depth to find the
/// first complete `{...}` span and parses only that.
pub fn extract_json_object(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        if value.is_object() {
            return Some(value);
        }
    }

    let bytes = text.as_bytes();
    let mut depth: i32 = 0;
    let mut start: Option<usize> = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start {
                        if let Ok(value) = serde_json::from_str::<Value>(&text[s..=i]) {
                            if value.is_object() {
                                return Some(value);
                            }
                        }
                    }
                    start = None;
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
