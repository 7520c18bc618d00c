// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turns a raw reasoning-collaborator reply into placement-ready text
//! (spec §4.I).

use regex::Regex;
use std::sync::LazyLock;

/// Whether generated content should be treated as source code or prose.
/// Drives which normalization rules steps 3/4 apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Code,
    Text,
}

const MAX_STRIP_PASSES: usize = 3;

#[allow(clippy::unwrap_used)]
static PREFIX_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)^\s*here(?:'s| is)[^\n]*:\s*\n").unwrap(),
        Regex::new(r"(?i)^\s*sure[,!]?[^\n]*:\s*\n").unwrap(),
        Regex::new(r"(?m)^\s*#{1,6}\s+[^\n]*\n").unwrap(),
        Regex::new(r"^\s*```[a-zA-Z0-9_+-]*\s*\n").unwrap(),
    ]
});

#[allow(clippy::unwrap_used)]
static SUFFIX_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"\n?\s*```\s*$").unwrap(),
        Regex::new(r"(?im)\n?\s*end of (?:code|text)\.?\s*$").unwrap(),
        Regex::new(r"(?im)\n?\s*let me know if[^\n]*$").unwrap(),
        Regex::new(r"(?im)\n?\s*(?:i hope|feel free to)[^\n]*$").unwrap(),
    ]
});

#[allow(clippy::unwrap_used)]
static COLLAPSED_STATEMENT_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\s*(?=\S)").unwrap());

/// Normalize raw generated content into placement-ready text.
///
/// Invariants (spec §4.I): a non-empty `raw` never produces an empty
/// result — if aggressive cleaning would, the original input is returned
/// instead. The function is idempotent: `process(process(x)) == process(x)`.
pub fn process(raw: &str, content_type: ContentType) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let stripped = strip_until_stable(raw);

    let typed = match content_type {
        ContentType::Code => normalize_code(&stripped),
        ContentType::Text => normalize_text(&stripped),
    };

    let deduped = dedup_adjacent_blocks(&typed);
    let cleaned = final_cleanup(&deduped);

    if cleaned.trim().is_empty() {
        final_cleanup(raw)
    } else {
        cleaned
    }
}

fn strip_until_stable(raw: &str) -> String {
    let mut current = raw.to_owned();
    for _ in 0..MAX_STRIP_PASSES {
        let next = strip_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn strip_once(text: &str) -> String {
    let mut result = text.to_owned();
    for pattern in PREFIX_PATTERNS.iter() {
        result = pattern.replace(&result, "").into_owned();
    }
    for pattern in SUFFIX_PATTERNS.iter() {
        result = pattern.replace(&result, "").into_owned();
    }
    result
}

fn normalize_code(text: &str) -> String {
    let fence_stripped = strip_inline_fences(text);
    let tab_width = if looks_like_web_language(text) { 2 } else { 4 };
    let despaced = fence_stripped.replace('\t', &" ".repeat(tab_width));
    expand_collapsed_statements(&despaced)
}

#[allow(clippy::unwrap_used)]
static INLINE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^```[a-zA-Z0-9_+-]*\s*$").unwrap());

fn strip_inline_fences(text: &str) -> String {
    INLINE_FENCE.replace_all(text, "").into_owned()
}

fn looks_like_web_language(text: &str) -> bool {
    text.contains("function ") || text.contains("<div") || text.contains("const ") || text.contains("{ ")
}

/// Best-effort expansion of a collapsed single-line statement body (e.g.
/// `def f(x): if cond: return x else: return None`) onto multiple lines at
/// colon statement boundaries. Only applied to single-line inputs — already
/// multi-line code is left untouched, since the heuristic can't
/// distinguish a dict literal's colon from a block header's.
fn expand_collapsed_statements(text: &str) -> String {
    let is_single_line = text.lines().filter(|l| !l.trim().is_empty()).count() <= 1;
    if !is_single_line || !COLLAPSED_STATEMENT_BOUNDARY.is_match(text) {
        return text.to_owned();
    }

    COLLAPSED_STATEMENT_BOUNDARY.replace_all(text, ":\n").into_owned()
}

#[allow(clippy::unwrap_used)]
static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

fn normalize_text(text: &str) -> String {
    BLANK_RUNS.replace_all(text, "\n\n").into_owned()
}

/// Remove consecutive duplicate blank-line-separated blocks, which happens
/// when the model repeats itself.
fn dedup_adjacent_blocks(text: &str) -> String {
    let blocks: Vec<&str> = text.split("\n\n").collect();
    let mut deduped: Vec<&str> = Vec::with_capacity(blocks.len());
    for block in blocks {
        if deduped.last() != Some(&block) {
            deduped.push(block);
        }
    }
    deduped.join("\n\n")
}

fn final_cleanup(text: &str) -> String {
    let trimmed_lines: Vec<String> = text.lines().map(|line| line.trim_end().to_owned()).collect();
    let mut result = trimmed_lines.join("\n");
    let trimmed = result.trim_end_matches('\n');
    result = trimmed.to_owned();
    if !result.is_empty() {
        result.push('\n');
    }
    result
}

#[cfg(test)]
#[path = "postprocess_tests.rs"]
mod tests;
