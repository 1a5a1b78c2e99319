// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw row to UI message conversion.
//!
//! Combines phone extraction, contact-name resolution, and role mapping to
//! turn persisted channel rows into the records the dashboard renders.
//! Pure assembly on top of the other pipeline pieces; the only policy it
//! owns is per-channel agent detection.

use std::sync::Arc;

use zapdesk_core::{now_iso, ChatRole, RawMessageRecord, UiMessage};

use crate::contacts::ContactResolver;
use crate::parse::parse_message;
use crate::phone::extract_phone;

/// Per-channel conversion policy: which sender hints mark the automated
/// side, and the fixed label shown for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRules {
    pub agent_hints: Vec<String>,
    pub agent_label: String,
}

impl Default for ChannelRules {
    fn default() -> Self {
        Self {
            agent_hints: ["ai", "assistant", "atendente", "agent", "bot"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            agent_label: "atendente".to_string(),
        }
    }
}

impl ChannelRules {
    /// True iff the sender hint case-insensitively matches an agent hint.
    pub fn is_agent(&self, sender_hint: Option<&str>) -> bool {
        let Some(hint) = sender_hint.map(str::trim).filter(|h| !h.is_empty()) else {
            return false;
        };
        self.agent_hints.iter().any(|h| h.eq_ignore_ascii_case(hint))
    }
}

/// Converts raw channel rows into UI messages for one channel.
#[derive(Debug, Clone)]
pub struct MessageConverter {
    rules: ChannelRules,
    resolver: Arc<ContactResolver>,
}

impl MessageConverter {
    pub fn new(rules: ChannelRules, resolver: Arc<ContactResolver>) -> Self {
        Self { rules, resolver }
    }

    /// Convert a single row whose message body is already plain text (the
    /// webhook-fresh path; no format detection involved).
    ///
    /// Content is the media payload when present, else the message field.
    /// Timestamp falls back to now when the row has no received-at value.
    pub fn raw_to_message(&self, row: &RawMessageRecord) -> UiMessage {
        let phone = extract_phone(&row.session_id);
        let from_agent = self.rules.is_agent(row.sender_hint.as_deref());
        let sender_name = if from_agent {
            self.rules.agent_label.clone()
        } else {
            self.resolver.resolve(
                &phone,
                &row.session_id,
                row.contact_name.as_deref(),
                row.received_at.as_deref(),
            )
        };
        let content = row
            .media_payload
            .clone()
            .unwrap_or_else(|| row.message.clone());
        let timestamp = row.received_at.clone().unwrap_or_else(now_iso);

        UiMessage {
            id: row.id.clone(),
            phone,
            sender_name,
            content,
            timestamp,
            from_agent,
        }
    }

    /// Convert a batch of stored rows (the history path).
    ///
    /// Each row's message body goes through detection, parsing, and
    /// cleaning; rows with no usable content are dropped from the output.
    /// A row counts as agent-side when its sender hint matches or its
    /// parsed role is [`ChatRole::Ai`].
    pub fn convert_rows(&self, rows: &[RawMessageRecord]) -> Vec<UiMessage> {
        let mut messages = Vec::with_capacity(rows.len());

        for row in rows {
            let Some(parsed) = parse_message(&row.message) else {
                continue;
            };

            let phone = extract_phone(&row.session_id);
            let from_agent =
                self.rules.is_agent(row.sender_hint.as_deref()) || parsed.role == ChatRole::Ai;
            let timestamp = row
                .received_at
                .clone()
                .unwrap_or_else(|| parsed.timestamp.clone());
            let sender_name = if from_agent {
                self.rules.agent_label.clone()
            } else {
                self.resolver.resolve(
                    &phone,
                    &row.session_id,
                    row.contact_name.as_deref(),
                    Some(&timestamp),
                )
            };
            let content = row.media_payload.clone().unwrap_or(parsed.content);

            messages.push(UiMessage {
                id: row.id.clone(),
                phone,
                sender_name,
                content,
                timestamp,
                from_agent,
            });
        }

        messages
    }
}
