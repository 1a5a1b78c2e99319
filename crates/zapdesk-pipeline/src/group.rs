// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation grouping.
//!
//! Folds an unordered batch of raw channel rows into one conversation
//! summary per contact. Webhook inserts arrive in no particular order, so
//! the "latest message" shown in the conversation list is decided by
//! timestamp comparison, never by arrival order.

use std::collections::HashMap;

use tracing::trace;
use zapdesk_core::{now_iso, ConversationStatus, ConversationSummary, RawMessageRecord};

use crate::contacts::ContactResolver;
use crate::phone::extract_phone;

/// Group a batch of rows into per-contact conversation summaries.
///
/// Rows without a session id, or whose phone extraction yields an empty
/// string, cannot be attributed to a contact and are skipped. Display
/// names go through the resolver (the row's name hint is offered as
/// `provided_name`; stickiness decides what wins), so one contact keeps
/// one name across the whole batch once any row has revealed it.
///
/// Summaries keep the message with the latest non-null timestamp: an
/// update happens only when the incoming row has a timestamp and the
/// stored one is null or strictly earlier (plain string comparison; the
/// service writes fixed-width UTC timestamps). Output order is insertion
/// order; callers sort by recency themselves.
pub fn group_by_contact(
    rows: &[RawMessageRecord],
    channel_id: &str,
    resolver: &ContactResolver,
) -> Vec<ConversationSummary> {
    let mut summaries: Vec<ConversationSummary> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for row in rows {
        if row.session_id.trim().is_empty() {
            trace!(row_id = %row.id, "skipping row without session id");
            continue;
        }
        let phone = extract_phone(&row.session_id);
        if phone.is_empty() {
            trace!(row_id = %row.id, session_id = %row.session_id, "skipping row without contact key");
            continue;
        }

        let display_name = resolver.resolve(
            &phone,
            &row.session_id,
            row.contact_name.as_deref(),
            row.received_at.as_deref(),
        );
        let content = row
            .media_payload
            .clone()
            .unwrap_or_else(|| row.message.clone());

        let key = (phone.clone(), display_name.clone());
        match index.get(&key) {
            None => {
                index.insert(key, summaries.len());
                summaries.push(ConversationSummary {
                    id: format!("{channel_id}:{phone}:{display_name}"),
                    contact_name: display_name,
                    contact_phone: phone,
                    last_message: content,
                    last_message_at: row.received_at.clone(),
                    status: ConversationStatus::Unread,
                    updated_at: now_iso(),
                });
            }
            Some(&slot) => {
                let summary = &mut summaries[slot];
                let Some(new_ts) = &row.received_at else {
                    continue;
                };
                let newer = summary
                    .last_message_at
                    .as_ref()
                    .is_none_or(|stored| new_ts.as_str() > stored.as_str());
                if newer {
                    summary.last_message = content;
                    summary.last_message_at = Some(new_ts.clone());
                    summary.updated_at = now_iso();
                }
            }
        }
    }

    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, session: &str, message: &str, received_at: Option<&str>) -> RawMessageRecord {
        RawMessageRecord {
            id: id.to_string(),
            session_id: session.to_string(),
            message: message.to_string(),
            sender_hint: None,
            contact_name: None,
            received_at: received_at.map(str::to_string),
            media_payload: None,
        }
    }

    #[test]
    fn groups_by_contact() {
        let resolver = ContactResolver::new();
        let rows = vec![
            row("1", "5511999998888@s.whatsapp.net", "oi", None),
            row("2", "5521888887777@s.whatsapp.net", "olá", None),
            row("3", "5511999998888@s.whatsapp.net", "tudo bem?", None),
        ];
        let summaries = group_by_contact(&rows, "loja-centro", &resolver);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].contact_phone, "5511999998888");
        assert_eq!(summaries[1].contact_phone, "5521888887777");
    }

    #[test]
    fn summary_id_is_channel_phone_name() {
        let resolver = ContactResolver::new();
        let mut r = row("1", "5511999998888", "oi", None);
        r.contact_name = Some("Maria".to_string());
        let summaries = group_by_contact(&[r], "loja-centro", &resolver);
        assert_eq!(summaries[0].id, "loja-centro:5511999998888:Maria");
        assert_eq!(summaries[0].contact_name, "Maria");
    }

    #[test]
    fn new_summaries_start_unread() {
        let resolver = ContactResolver::new();
        let summaries = group_by_contact(
            &[row("1", "5511999998888", "oi", None)],
            "loja",
            &resolver,
        );
        assert_eq!(summaries[0].status, ConversationStatus::Unread);
    }

    #[test]
    fn out_of_order_rows_keep_latest_timestamp() {
        let resolver = ContactResolver::new();
        let rows = vec![
            row(
                "1",
                "5511999998888",
                "depois",
                Some("2024-01-02T00:00:00.000Z"),
            ),
            row(
                "2",
                "5511999998888",
                "antes",
                Some("2024-01-01T00:00:00.000Z"),
            ),
        ];
        let summaries = group_by_contact(&rows, "loja", &resolver);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].last_message, "depois");
        assert_eq!(
            summaries[0].last_message_at.as_deref(),
            Some("2024-01-02T00:00:00.000Z")
        );
    }

    #[test]
    fn null_timestamp_row_never_overwrites() {
        let resolver = ContactResolver::new();
        let rows = vec![
            row("1", "5511999998888", "hi", None),
            row(
                "2",
                "5511999998888",
                "bye",
                Some("2024-01-02T00:00:00.000Z"),
            ),
            row("3", "5511999998888", "ghost", None),
        ];
        let summaries = group_by_contact(&rows, "loja", &resolver);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].last_message, "bye");
        assert_eq!(
            summaries[0].last_message_at.as_deref(),
            Some("2024-01-02T00:00:00.000Z")
        );
    }

    #[test]
    fn timestamped_row_replaces_null_start() {
        let resolver = ContactResolver::new();
        let rows = vec![
            row("1", "5511999998888", "hi", None),
            row(
                "2",
                "5511999998888",
                "bye",
                Some("2024-01-02T00:00:00.000Z"),
            ),
        ];
        let summaries = group_by_contact(&rows, "loja", &resolver);
        assert_eq!(summaries[0].last_message, "bye");
    }

    #[test]
    fn equal_timestamp_does_not_overwrite() {
        let resolver = ContactResolver::new();
        let ts = Some("2024-01-02T00:00:00.000Z");
        let rows = vec![
            row("1", "5511999998888", "first", ts),
            row("2", "5511999998888", "second", ts),
        ];
        let summaries = group_by_contact(&rows, "loja", &resolver);
        assert_eq!(summaries[0].last_message, "first");
    }

    #[test]
    fn skips_rows_without_session_or_phone() {
        let resolver = ContactResolver::new();
        let rows = vec![
            row("1", "", "no session", None),
            row("2", "   ", "blank session", None),
            row("3", "@s.whatsapp.net", "empty extraction", None),
            row("4", "5511999998888", "kept", None),
        ];
        let summaries = group_by_contact(&rows, "loja", &resolver);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].last_message, "kept");
    }

    #[test]
    fn sticky_name_merges_later_rows() {
        let resolver = ContactResolver::new();
        let mut named = row("1", "5511999998888", "oi", None);
        named.contact_name = Some("Maria".to_string());
        let mut renamed = row("2", "5511999998888", "voltei", None);
        renamed.contact_name = Some("Outro Nome".to_string());
        let summaries = group_by_contact(&[named, renamed], "loja", &resolver);
        // Stickiness keeps both rows under the first resolved name.
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].contact_name, "Maria");
    }

    #[test]
    fn fallback_then_name_splits_conversations() {
        let resolver = ContactResolver::new();
        let anonymous = row("1", "5511999998888", "oi", None);
        let mut named = row("2", "5511999998888", "sou a Maria", None);
        named.contact_name = Some("Maria".to_string());
        let summaries = group_by_contact(&[anonymous, named], "loja", &resolver);
        // One summary per distinct (phone, name) pair observed in the batch:
        // the first row saw the digit fallback, the second the real name.
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].contact_name, "8888");
        assert_eq!(summaries[1].contact_name, "Maria");
    }

    #[test]
    fn media_payload_is_the_preview() {
        let resolver = ContactResolver::new();
        let mut r = row("1", "5511999998888", "[Imagem]", None);
        r.media_payload = Some("data:image/png;base64,CCCC".to_string());
        let summaries = group_by_contact(&[r], "loja", &resolver);
        assert_eq!(summaries[0].last_message, "data:image/png;base64,CCCC");
    }

    #[test]
    fn output_is_insertion_ordered() {
        let resolver = ContactResolver::new();
        let rows = vec![
            row("1", "5531777776666", "c", None),
            row("2", "5511999998888", "a", None),
            row("3", "5521888887777", "b", None),
        ];
        let summaries = group_by_contact(&rows, "loja", &resolver);
        let phones: Vec<&str> = summaries.iter().map(|s| s.contact_phone.as_str()).collect();
        assert_eq!(phones, ["5531777776666", "5511999998888", "5521888887777"]);
    }

    #[test]
    fn regrouping_same_input_is_deterministic() {
        let resolver = ContactResolver::new();
        let rows = vec![
            row("1", "5511999998888", "oi", Some("2024-01-01T00:00:00.000Z")),
            row("2", "5521888887777", "olá", None),
            row(
                "3",
                "5511999998888",
                "tudo bem?",
                Some("2024-01-03T00:00:00.000Z"),
            ),
        ];
        let first = group_by_contact(&rows, "loja", &resolver);
        let second = group_by_contact(&rows, "loja", &resolver);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.last_message, b.last_message);
            assert_eq!(a.last_message_at, b.last_message_at);
        }
    }
}
