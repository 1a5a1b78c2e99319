// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `zapdesk status` command implementation.
//!
//! Inspects the database directly: per configured channel, whether its
//! table exists and how many rows it holds. Works whether or not the
//! server is running; an absent database is reported, not created.

use zapdesk_config::ZapdeskConfig;
use zapdesk_core::ZapdeskError;
use zapdesk_storage::queries::channel_rows;
use zapdesk_storage::Database;

/// Run the `zapdesk status` command.
pub async fn run_status(config: &ZapdeskConfig) -> Result<(), ZapdeskError> {
    let path = &config.storage.database_path;

    println!();
    println!("  zapdesk status");
    println!("  {}", "-".repeat(35));

    if !std::path::Path::new(path).exists() {
        println!("    Database: {path} (not found)");
        println!();
        println!("  Start with: zapdesk serve");
        println!();
        return Ok(());
    }

    let db = Database::open_with_wal(path, config.storage.wal_mode).await?;
    println!("    Database: {path}");

    if config.channels.is_empty() {
        println!("    Channels: none configured");
    }
    for channel in &config.channels {
        let table = channel.table_name();
        if channel_rows::table_exists(&db, table).await? {
            let rows = channel_rows::count_rows(&db, table).await?;
            println!("    {:<16} {rows} rows (table: {table})", channel.id);
        } else {
            println!("    {:<16} table missing: {table}", channel.id);
        }
    }

    db.close().await?;
    println!();
    Ok(())
}
