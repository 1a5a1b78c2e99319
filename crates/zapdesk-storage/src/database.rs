// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use tracing::debug;
use zapdesk_core::ZapdeskError;

use crate::migrations;

/// Convert a tokio-rusqlite error into the service error type.
pub(crate) fn map_tr_err(err: tokio_rusqlite::Error) -> ZapdeskError {
    ZapdeskError::Storage {
        source: Box::new(err),
    }
}

/// Handle to the single SQLite connection.
///
/// Cloning is cheap: clones share the one background connection thread,
/// which is what serializes writes.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` in WAL mode and
    /// run pending migrations.
    pub async fn open(path: &str) -> Result<Self, ZapdeskError> {
        Self::open_with_wal(path, true).await
    }

    /// Open with an explicit journal mode choice.
    ///
    /// WAL is the default; rollback-journal mode exists for read-only
    /// inspection of databases on filesystems where WAL is unavailable.
    pub async fn open_with_wal(path: &str, wal_mode: bool) -> Result<Self, ZapdeskError> {
        let parent = std::path::Path::new(path).parent();
        if let Some(dir) = parent
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir).map_err(|e| ZapdeskError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(map_tr_err)?;

        let journal = if wal_mode { "WAL" } else { "DELETE" };
        let pragmas = format!(
            "PRAGMA journal_mode={journal};
             PRAGMA busy_timeout=5000;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;"
        );
        conn.call(move |conn| {
            conn.execute_batch(&pragmas)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        // Migrations run on the connection's own thread; the inner Result
        // carries migration failures out of the closure.
        let report = conn
            .call(|conn| Ok(migrations::run_migrations(conn)))
            .await
            .map_err(map_tr_err)?;
        report?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection handle.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL into the main database file.
    ///
    /// Called on shutdown so the `.db` file alone is a complete snapshot.
    pub async fn close(&self) -> Result<(), ZapdeskError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}
