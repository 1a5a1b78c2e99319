// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamp generation.

use chrono::{SecondsFormat, Utc};

/// Current UTC time as an ISO-8601 string with millisecond precision and a
/// `Z` suffix (e.g. `2026-01-01T00:00:00.000Z`).
///
/// Fixed-width output keeps service-generated timestamps comparable with
/// plain string ordering, which the conversation recency rule relies on.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
