// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage-facing row shapes.
//!
//! Reads come back as [`RawMessageRecord`] (re-exported from
//! `zapdesk-core`); the pipeline owns everything downstream of that.

pub use zapdesk_core::RawMessageRecord;

/// A webhook-fresh message about to be inserted into a channel table.
///
/// `created_at` is always set by the gateway (payload timestamp or now);
/// the nullable fields follow the canonical table shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChannelRow {
    pub session_id: String,
    pub message: String,
    pub sender: Option<String>,
    pub contact_name: Option<String>,
    pub media_base64: Option<String>,
    pub created_at: String,
}
