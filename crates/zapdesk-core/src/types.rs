// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical domain types shared across the Zapdesk pipeline, storage, and
//! gateway crates.
//!
//! Timestamps are ISO-8601 strings throughout. Values generated by this
//! service come from [`crate::time::now_iso`] (millisecond precision, `Z`
//! suffix), which keeps them fixed-width and therefore ordered under plain
//! string comparison.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Who authored a message, as far as the stored encoding reveals it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The external contact.
    Human,
    /// The automated/internal side (bot or agent tooling).
    Ai,
}

/// Read state of a conversation as shown in the dashboard list.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    /// New activity since the conversation was last opened.
    #[default]
    Unread,
    /// Explicitly marked read by an operator.
    Read,
}

/// One message row as stored by an upstream channel table.
///
/// The storage layer normalizes the per-table schema variants into this
/// shape; everything downstream consumes only this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessageRecord {
    /// Opaque record identifier; numeric upstream ids are stringified.
    pub id: String,
    /// Upstream conversation key. May embed a phone number, may not.
    pub session_id: String,
    /// Raw message body: a plain string or a JSON-encoded value.
    pub message: String,
    /// Role tag from the source ("ai", "atendente", "Cliente", ...);
    /// vocabulary varies per channel.
    pub sender_hint: Option<String>,
    /// Contact display-name hint; the backing column name and casing vary
    /// per source table, and the value is frequently null.
    pub contact_name: Option<String>,
    /// Stored timestamp; absence must be tolerated.
    pub received_at: Option<String>,
    /// Embedded media as a `data:<mime>;base64,...` URL when non-text.
    pub media_payload: Option<String>,
}

/// Canonical post-parsing message shape.
///
/// `content` is non-empty and whitespace-normalized; parsers never produce
/// a `ParsedMessage` with empty content (they return `None` instead).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedMessage {
    pub content: String,
    pub timestamp: String,
    pub role: ChatRole,
}

/// An authoritative contact identity held by the resolver cache.
///
/// Once a phone has a non-empty `display_name`, the name is immutable for
/// the process lifetime; only an administrative override replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedContact {
    pub phone: String,
    pub display_name: String,
    pub resolved_at: String,
}

/// One message as served to the dashboard for an open conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiMessage {
    pub id: String,
    pub phone: String,
    pub sender_name: String,
    pub content: String,
    pub timestamp: String,
    pub from_agent: bool,
}

/// One entry in the dashboard conversation list.
///
/// Summaries are views recomputed per read; only `status` has persistent
/// backing (the `conversation_state` table), overlaid by the serving layer.
/// Invariant: `last_message`/`last_message_at` reflect the batch message
/// with the latest non-null timestamp; a null or earlier timestamp never
/// overwrites a more recent one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Derived composite key: `<channel>:<phone>:<display name>`.
    pub id: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub last_message: String,
    pub last_message_at: Option<String>,
    pub status: ConversationStatus,
    pub updated_at: String,
}
