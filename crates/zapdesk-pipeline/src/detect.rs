// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message format detection.
//!
//! Upstream channel integrations have stored message bodies in several
//! overlapping encodings over time: LangChain-style objects (with
//! `additional_kwargs`/`tool_calls` metadata), legacy `{message: ...}`
//! wrappers, bare `{type, content}` pairs, and plain text. This module
//! classifies a raw stored value into exactly one [`MessageFormat`] so the
//! parsers in [`crate::parse`] can dispatch exhaustively.
//!
//! The check order in [`classify`] is a deliberate tie-break between
//! overlapping shapes and must not be reordered: a `{type, content}` record
//! may incidentally also carry a `message` key, and the looser legacy check
//! would misclassify it if it ran first.

use serde_json::Value;

/// The closed set of message encodings a channel table may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFormat {
    /// LangChain message delivered as an already-decoded JSON object.
    LangchainObject,
    /// LangChain message delivered as a JSON-encoded string.
    LangchainString,
    /// Legacy automation wrapper: `{"message": ...}` with no other markers.
    LegacyN8n,
    /// Bare `{type, content}` pair, or a plain non-JSON string.
    SimpleJson,
    /// Nothing recognizable; the record carries no extractable message.
    Unknown,
}

/// Classification result: the detected format plus a confidence score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub format: MessageFormat,
    pub confidence: f32,
}

/// Structural match on a known shape.
pub const CONFIDENCE_HIGH: f32 = 0.9;
/// Heuristic match on the loose legacy shape.
pub const CONFIDENCE_LEGACY: f32 = 0.7;
/// Plain text fallback; nothing structural to go on.
pub const CONFIDENCE_LOW: f32 = 0.3;
/// No match at all.
pub const CONFIDENCE_NONE: f32 = 0.0;

/// Keys whose presence marks a LangChain-produced message.
const LANGCHAIN_MARKERS: [&str; 3] = ["additional_kwargs", "response_metadata", "tool_calls"];

/// Classify a raw stored message string.
///
/// A string that does not parse as JSON is literal text content and
/// classifies as [`MessageFormat::SimpleJson`] with low confidence. A string
/// that parses to a LangChain-marked object classifies as
/// [`MessageFormat::LangchainString`].
pub fn detect(raw: &str) -> Detection {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => classify(&value, MessageFormat::LangchainString),
        Err(_) => Detection {
            format: MessageFormat::SimpleJson,
            confidence: CONFIDENCE_LOW,
        },
    }
}

/// Classify an already-decoded JSON value.
///
/// LangChain markers on a decoded value classify as
/// [`MessageFormat::LangchainObject`].
pub fn detect_value(value: &Value) -> Detection {
    classify(value, MessageFormat::LangchainObject)
}

/// Shared classifier. `langchain_format` distinguishes string-origin from
/// object-origin inputs; the parsers treat both identically.
fn classify(value: &Value, langchain_format: MessageFormat) -> Detection {
    let Some(obj) = value.as_object() else {
        // Scalars and arrays carry no message shape.
        return Detection {
            format: MessageFormat::Unknown,
            confidence: CONFIDENCE_NONE,
        };
    };

    // 1. LangChain metadata keys trump everything else.
    if LANGCHAIN_MARKERS.iter().any(|key| obj.contains_key(*key)) {
        return Detection {
            format: langchain_format,
            confidence: CONFIDENCE_HIGH,
        };
    }

    // 2. A non-empty `type` tag plus a `content` key (value may be empty or
    //    null; presence is the check). Must run before the legacy check.
    let has_type_tag = obj
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|t| !t.is_empty());
    if has_type_tag && obj.contains_key("content") {
        return Detection {
            format: MessageFormat::SimpleJson,
            confidence: CONFIDENCE_HIGH,
        };
    }

    // 3. Legacy wrapper: a `message` key and none of the stricter markers.
    if obj.contains_key("message")
        && !obj.contains_key("type")
        && !obj.contains_key("content")
        && !obj.contains_key("additional_kwargs")
    {
        return Detection {
            format: MessageFormat::LegacyN8n,
            confidence: CONFIDENCE_LEGACY,
        };
    }

    Detection {
        format: MessageFormat::Unknown,
        confidence: CONFIDENCE_NONE,
    }
}
