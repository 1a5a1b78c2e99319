// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reads and writes against per-channel message tables.
//!
//! Channel tables predate this service and their shapes drifted per
//! upstream integration: column names vary in language and casing, and
//! optional columns may be missing entirely. Reads probe the actual shape
//! via `PRAGMA table_info` and pick the first matching column name per
//! canonical field, selecting a NULL literal for optional fields the
//! table never had. Session and message columns have no fallback; a table
//! without them cannot hold messages. Writes target whichever of the
//! canonical columns exist.
//!
//! Table names come from configuration and are interpolated into SQL, so
//! every entry point re-validates them as plain identifiers.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension};
use zapdesk_core::{RawMessageRecord, ZapdeskError};

use crate::database::Database;
use crate::models::NewChannelRow;

/// Column-name variants per canonical field, probed in order.
const SESSION_COLUMNS: [&str; 2] = ["session_id", "sessionId"];
const MESSAGE_COLUMNS: [&str; 2] = ["message", "mensagem"];
const SENDER_COLUMNS: [&str; 3] = ["remetente", "Remetente", "sender"];
const NAME_COLUMNS: [&str; 3] = ["nome_do_contato", "Nome_do_contato", "contact_name"];
const RECEIVED_COLUMNS: [&str; 3] = ["created_at", "data", "timestamp"];
const MEDIA_COLUMNS: [&str; 2] = ["media_base64", "media"];

fn valid_table_ident(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn check_table_ident(table: &str) -> Result<(), ZapdeskError> {
    if valid_table_ident(table) {
        Ok(())
    } else {
        Err(ZapdeskError::Storage {
            source: format!("invalid channel table name: {table:?}").into(),
        })
    }
}

fn table_exists_inner(conn: &rusqlite::Connection, name: &str) -> Result<bool, rusqlite::Error> {
    let exists: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type='table' AND name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(exists.is_some())
}

fn column_exists(
    conn: &rusqlite::Connection,
    table: &str,
    column: &str,
) -> Result<bool, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{table}\")"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn pick_column(
    conn: &rusqlite::Connection,
    table: &str,
    preferred: &[&str],
) -> Result<Option<String>, rusqlite::Error> {
    for col in preferred {
        if column_exists(conn, table, col)? {
            return Ok(Some((*col).to_string()));
        }
    }
    Ok(None)
}

/// Stringify a dynamically typed SQLite value; NULL and blobs map to `None`.
fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null | Value::Blob(_) => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(f) => Some(f.to_string()),
        Value::Text(s) => Some(s),
    }
}

/// Whether the channel table exists.
pub async fn table_exists(db: &Database, table: &str) -> Result<bool, ZapdeskError> {
    check_table_ident(table)?;
    let table = table.to_string();
    db.connection()
        .call(move |conn| Ok(table_exists_inner(conn, &table)?))
        .await
        .map_err(crate::database::map_tr_err)
}

/// Create the canonical channel table shape if the table is absent.
///
/// Pre-existing tables are left untouched whatever their shape; reads
/// adapt to them instead.
pub async fn ensure_channel_table(db: &Database, table: &str) -> Result<(), ZapdeskError> {
    check_table_ident(table)?;
    let table = table.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS \"{table}\" (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    session_id TEXT NOT NULL,
                    message TEXT NOT NULL,
                    remetente TEXT,
                    nome_do_contato TEXT,
                    media_base64 TEXT,
                    created_at TEXT
                );
                CREATE INDEX IF NOT EXISTS \"idx_{table}_session\"
                    ON \"{table}\" (session_id);"
            ))?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Read every row of a channel table as canonical records, oldest insert
/// first. An absent table reads as empty; a present table missing its
/// session or message column is a storage error.
pub async fn fetch_channel_rows(
    db: &Database,
    table: &str,
) -> Result<Vec<RawMessageRecord>, ZapdeskError> {
    check_table_ident(table)?;
    let table = table.to_string();
    db.connection()
        .call(move |conn| {
            if !table_exists_inner(conn, &table)? {
                return Ok(Vec::new());
            }

            let id_col = pick_column(conn, &table, &["id"])?.unwrap_or_else(|| "rowid".to_string());
            let Some(session_col) = pick_column(conn, &table, &SESSION_COLUMNS)? else {
                return Err(tokio_rusqlite::Error::Other(
                    format!("channel table {table} has no session column").into(),
                ));
            };
            let Some(message_col) = pick_column(conn, &table, &MESSAGE_COLUMNS)? else {
                return Err(tokio_rusqlite::Error::Other(
                    format!("channel table {table} has no message column").into(),
                ));
            };
            let sender_col = pick_column(conn, &table, &SENDER_COLUMNS)?;
            let name_col = pick_column(conn, &table, &NAME_COLUMNS)?;
            let received_col = pick_column(conn, &table, &RECEIVED_COLUMNS)?;
            let media_col = pick_column(conn, &table, &MEDIA_COLUMNS)?;

            let sql = format!(
                "SELECT {id}, {session_col}, {message_col}, {sender}, {name}, {received}, {media}
                 FROM \"{table}\" ORDER BY {id} ASC",
                id = id_col,
                sender = sender_col.as_deref().unwrap_or("NULL"),
                name = name_col.as_deref().unwrap_or("NULL"),
                received = received_col.as_deref().unwrap_or("NULL"),
                media = media_col.as_deref().unwrap_or("NULL"),
            );

            let mut stmt = conn.prepare(&sql)?;
            let mapped = stmt.query_map([], |row| {
                Ok(RawMessageRecord {
                    id: value_to_string(row.get(0)?).unwrap_or_default(),
                    session_id: value_to_string(row.get(1)?).unwrap_or_default(),
                    message: value_to_string(row.get(2)?).unwrap_or_default(),
                    sender_hint: value_to_string(row.get(3)?),
                    contact_name: value_to_string(row.get(4)?),
                    received_at: value_to_string(row.get(5)?),
                    media_payload: value_to_string(row.get(6)?),
                })
            })?;

            let mut records = Vec::new();
            for record in mapped {
                records.push(record?);
            }
            Ok(records)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert a webhook-fresh row, writing whichever canonical columns the
/// table has. Returns the new rowid.
pub async fn insert_channel_row(
    db: &Database,
    table: &str,
    row: &NewChannelRow,
) -> Result<i64, ZapdeskError> {
    check_table_ident(table)?;
    let table = table.to_string();
    let row = row.clone();
    db.connection()
        .call(move |conn| {
            let Some(session_col) = pick_column(conn, &table, &SESSION_COLUMNS)? else {
                return Err(tokio_rusqlite::Error::Other(
                    format!("channel table {table} has no session column").into(),
                ));
            };
            let Some(message_col) = pick_column(conn, &table, &MESSAGE_COLUMNS)? else {
                return Err(tokio_rusqlite::Error::Other(
                    format!("channel table {table} has no message column").into(),
                ));
            };

            let mut columns = vec![session_col, message_col];
            let mut values: Vec<Value> = vec![row.session_id.into(), row.message.into()];

            if let Some(col) = pick_column(conn, &table, &SENDER_COLUMNS)? {
                columns.push(col);
                values.push(row.sender.into());
            }
            if let Some(col) = pick_column(conn, &table, &NAME_COLUMNS)? {
                columns.push(col);
                values.push(row.contact_name.into());
            }
            if let Some(col) = pick_column(conn, &table, &MEDIA_COLUMNS)? {
                columns.push(col);
                values.push(row.media_base64.into());
            }
            if let Some(col) = pick_column(conn, &table, &RECEIVED_COLUMNS)? {
                columns.push(col);
                values.push(row.created_at.into());
            }

            let placeholders = (1..=columns.len())
                .map(|i| format!("?{i}"))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "INSERT INTO \"{table}\" ({}) VALUES ({placeholders})",
                columns.join(", ")
            );
            conn.execute(&sql, params_from_iter(values))?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Row count of a channel table.
pub async fn count_rows(db: &Database, table: &str) -> Result<i64, ZapdeskError> {
    check_table_ident(table)?;
    let table = table.to_string();
    db.connection()
        .call(move |conn| {
            let n = conn.query_row(&format!("SELECT count(*) FROM \"{table}\""), [], |row| {
                row.get(0)
            })?;
            Ok(n)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
