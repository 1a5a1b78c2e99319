// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message normalization and conversation reconstruction.
//!
//! The core of the Zapdesk service: channel integrations have stored
//! message bodies in several overlapping encodings over time, and contact
//! identity arrives inconsistently encoded in session ids and optional
//! name columns. This crate turns that mess into canonical messages and
//! per-contact conversation summaries:
//!
//! - [`detect`]: classify a raw stored value into a closed format enum.
//! - [`parse`]: one parser per format, shared whitespace cleaning.
//! - [`phone`]: total phone-number extraction from session identifiers.
//! - [`contacts`]: sticky first-name-wins contact resolution.
//! - [`convert`]: raw rows to UI-ready message records.
//! - [`group`]: fold unordered batches into conversation summaries.
//!
//! Everything here is synchronous and I/O-free; the only shared mutable
//! state is the resolver cache.

pub mod contacts;
pub mod convert;
pub mod detect;
pub mod group;
pub mod parse;
pub mod phone;

pub use contacts::{ContactResolver, ResolverStats};
pub use convert::{ChannelRules, MessageConverter};
pub use detect::{detect, detect_value, Detection, MessageFormat};
pub use group::group_by_contact;
pub use parse::{clean_content, parse_message, parse_value};
pub use phone::{extract_phone, is_valid_phone};
