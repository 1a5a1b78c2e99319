// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone number extraction from free-form session identifiers.
//!
//! WhatsApp-style session ids usually embed the contact's phone number
//! (`5511999998888@s.whatsapp.net`), but some channels use bare numbers or
//! opaque tokens. Extraction is total: it always returns *something* usable
//! as a grouping key, and [`is_valid_phone`] tells callers whether that
//! something is a real phone number.

use std::sync::LazyLock;

use regex::Regex;

static PHONE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{10,15}").unwrap());
static PHONE_EXACT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{10,15}$").unwrap());

/// Derive a normalized phone number from a session identifier.
///
/// Returns the first contiguous run of 10-15 digits found anywhere in the
/// input. Without one, strips everything from the first `@` onward and
/// returns the remainder verbatim. Never fails; worst case the input comes
/// back unchanged.
pub fn extract_phone(session_id: &str) -> String {
    if let Some(m) = PHONE_RUN.find(session_id) {
        return m.as_str().to_string();
    }
    match session_id.split_once('@') {
        Some((before, _)) => before.to_string(),
        None => session_id.to_string(),
    }
}

/// True iff `s` is purely 10-15 digits.
pub fn is_valid_phone(s: &str) -> bool {
    PHONE_EXACT.is_match(s)
}
