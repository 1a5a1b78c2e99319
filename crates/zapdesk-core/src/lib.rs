// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Zapdesk conversation service.
//!
//! Provides the canonical domain types flowing between the storage,
//! pipeline, and gateway crates, plus the shared error type and the
//! timestamp helper every crate generates "now" values with.

pub mod error;
pub mod time;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ZapdeskError;
pub use time::now_iso;
pub use types::{
    ChatRole, ConversationStatus, ConversationSummary, ParsedMessage, RawMessageRecord,
    ResolvedContact, UiMessage,
};
