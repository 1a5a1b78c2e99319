// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-format message parsers and shared content cleaning.
//!
//! Each parser turns one detected encoding into a canonical
//! [`ParsedMessage`], or `None` when the record holds no usable content
//! after cleaning. Callers drop `None` records silently; an empty chat
//! bubble is worse than a skipped row.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use zapdesk_core::{now_iso, ChatRole, ParsedMessage};

use crate::detect::{detect_value, MessageFormat};

static NEWLINE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\r\n]+").unwrap());
static SPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

/// Normalize whitespace in message content.
///
/// In order: trim, collapse runs of newline characters (including `\r`)
/// into single `\n`, strip leading/trailing newlines, collapse runs of
/// spaces and tabs into a single space. Idempotent. An empty result means
/// the record had no displayable content.
pub fn clean_content(raw: &str) -> String {
    let trimmed = raw.trim();
    let collapsed = NEWLINE_RUNS.replace_all(trimmed, "\n");
    let stripped = collapsed.trim_matches('\n');
    SPACE_RUNS.replace_all(stripped, " ").into_owned()
}

/// Parse a raw stored message string into its canonical form.
///
/// A string that does not parse as JSON is literal text content (role
/// [`ChatRole::Human`]); anything else dispatches on the detected format.
pub fn parse_message(raw: &str) -> Option<ParsedMessage> {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => parse_value(&value),
        Err(_) => {
            let content = clean_content(raw);
            (!content.is_empty()).then(|| ParsedMessage {
                content,
                timestamp: now_iso(),
                role: ChatRole::Human,
            })
        }
    }
}

/// Parse an already-decoded JSON message value.
pub fn parse_value(value: &Value) -> Option<ParsedMessage> {
    match detect_value(value).format {
        MessageFormat::LangchainObject | MessageFormat::LangchainString => parse_langchain(value),
        MessageFormat::SimpleJson => parse_simple_json(value),
        MessageFormat::LegacyN8n => parse_legacy(value),
        MessageFormat::Unknown => None,
    }
}

/// LangChain shapes: prefer the first tool call's `message` argument,
/// falling back to the direct `content` field.
fn parse_langchain(value: &Value) -> Option<ParsedMessage> {
    let obj = value.as_object()?;

    if let Some(content) = tool_call_message(obj) {
        return Some(ParsedMessage {
            content,
            timestamp: now_iso(),
            role: ChatRole::Ai,
        });
    }

    let content = clean_content(obj.get("content").and_then(Value::as_str)?);
    if content.is_empty() {
        return None;
    }
    let role = if obj.get("type").and_then(Value::as_str) == Some("ai") {
        ChatRole::Ai
    } else {
        ChatRole::Human
    };
    Some(ParsedMessage {
        content,
        timestamp: now_iso(),
        role,
    })
}

/// Extract message text from `tool_calls[0].function.arguments`, if usable.
fn tool_call_message(obj: &Map<String, Value>) -> Option<String> {
    let args = obj
        .get("tool_calls")?
        .as_array()?
        .first()?
        .get("function")?
        .get("arguments")?;

    // `arguments` is usually a JSON-encoded string, but some rows store it
    // already decoded.
    let decoded;
    let args = match args {
        Value::String(raw) => {
            decoded = serde_json::from_str::<Value>(raw).ok()?;
            &decoded
        }
        other => other,
    };

    let content = clean_content(args.get("message")?.as_str()?);
    (!content.is_empty()).then_some(content)
}

/// Bare `{type, content}` records, with an optional embedded timestamp.
fn parse_simple_json(value: &Value) -> Option<ParsedMessage> {
    let obj = value.as_object()?;
    let content = clean_content(obj.get("content").and_then(Value::as_str)?);
    if content.is_empty() {
        return None;
    }
    let role = match obj.get("type").and_then(Value::as_str) {
        Some("ai") | Some("assistant") => ChatRole::Ai,
        _ => ChatRole::Human,
    };
    let timestamp = obj
        .get("timestamp")
        .and_then(Value::as_str)
        .filter(|ts| !ts.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(now_iso);
    Some(ParsedMessage {
        content,
        timestamp,
        role,
    })
}

/// Legacy automation wrapper: the `message` string is the content, always
/// from the contact side.
fn parse_legacy(value: &Value) -> Option<ParsedMessage> {
    let content = clean_content(value.get("message")?.as_str()?);
    (!content.is_empty()).then(|| ParsedMessage {
        content,
        timestamp: now_iso(),
        role: ChatRole::Human,
    })
}
