// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Zapdesk conversation service.
//!
//! Two surfaces share one axum router: the webhook intake that upstream
//! channel integrations POST raw messages to, and the REST API the
//! dashboard reads conversations from. Everything except `/health` sits
//! behind bearer-token auth.

pub mod auth;
pub mod handlers;
pub mod media;
pub mod server;

pub use auth::AuthConfig;
pub use media::{MediaFetcher, MediaKind};
pub use server::{build_router, start_server, ChannelRoute, GatewayState, ServerConfig};
