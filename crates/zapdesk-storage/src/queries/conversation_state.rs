// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted read-status per conversation.
//!
//! Summaries themselves are recomputed on every read; the read/unread flag
//! is the one piece that survives, keyed by the summary's composite id.

use std::collections::HashMap;

use rusqlite::params;
use zapdesk_core::{now_iso, ConversationStatus, ZapdeskError};

use crate::database::Database;

/// Upsert the status for a conversation id.
pub async fn set_conversation_status(
    db: &Database,
    conversation_id: &str,
    status: ConversationStatus,
) -> Result<(), ZapdeskError> {
    let conversation_id = conversation_id.to_string();
    let status = status.to_string();
    let updated_at = now_iso();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversation_state (conversation_id, status, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(conversation_id) DO UPDATE SET
                     status = excluded.status,
                     updated_at = excluded.updated_at",
                params![conversation_id, status, updated_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All persisted statuses, keyed by conversation id.
///
/// Unrecognized stored values read as the default status rather than
/// failing the whole listing.
pub async fn all_conversation_statuses(
    db: &Database,
) -> Result<HashMap<String, ConversationStatus>, ZapdeskError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare("SELECT conversation_id, status FROM conversation_state")?;
            let mapped = stmt.query_map([], |row| {
                let id: String = row.get(0)?;
                let status: String = row.get(1)?;
                Ok((id, status))
            })?;

            let mut statuses = HashMap::new();
            for entry in mapped {
                let (id, status) = entry?;
                statuses.insert(id, status.parse().unwrap_or_default());
            }
            Ok(statuses)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
