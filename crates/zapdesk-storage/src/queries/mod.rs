// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for channel tables and conversation state.

pub mod channel_rows;
pub mod conversation_state;
