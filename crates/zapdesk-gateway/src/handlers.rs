// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Handles POST /webhook/{channel} intake and the dashboard endpoints
//! under /v1.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use zapdesk_core::{now_iso, ConversationStatus, ZapdeskError};
use zapdesk_pipeline::{extract_phone, group_by_contact, MessageConverter};
use zapdesk_storage::queries::{channel_rows, conversation_state};
use zapdesk_storage::NewChannelRow;

use crate::media::MediaKind;
use crate::server::GatewayState;

/// Request body for POST /webhook/{channel}.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    /// Upstream conversation key (usually a WhatsApp JID).
    pub session_id: String,
    /// Contact display name as pushed by the channel.
    #[serde(default)]
    pub push_name: Option<String>,
    /// Sender role tag ("ai", "atendente", ...).
    #[serde(default)]
    pub sender: Option<String>,
    /// Message text, or the caption when media is attached.
    #[serde(default)]
    pub text: Option<String>,
    /// URL of an attachment to download and inline.
    #[serde(default)]
    pub media_url: Option<String>,
    /// Attachment kind tag or MIME type.
    #[serde(default)]
    pub media_type: Option<String>,
    /// Message timestamp; defaults to the arrival time.
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Response body for POST /webhook/{channel}.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    /// Rowid of the stored message.
    pub id: i64,
}

/// One entry in the GET /v1/channels listing.
#[derive(Debug, Serialize)]
pub struct ChannelInfo {
    /// Channel id as used in URLs.
    pub id: String,
    /// Human-facing name.
    pub label: String,
}

/// Request body for POST /v1/conversations/{id}/status.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    /// New read state.
    pub status: ConversationStatus,
}

/// Response body for POST /v1/conversations/{id}/status.
#[derive(Debug, Serialize)]
pub struct StatusAck {
    /// Conversation id the status was stored under.
    pub id: String,
    /// Stored status.
    pub status: ConversationStatus,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Health status string.
    pub status: String,
    /// Binary version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_secs: u64,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

fn unknown_channel(channel: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("unknown channel: {channel}"),
        }),
    )
        .into_response()
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn storage_error(err: ZapdeskError) -> Response {
    tracing::error!(error = %err, "storage query failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

/// POST /webhook/{channel}
///
/// Stores an inbound message into the channel's table. Media is
/// downloaded and inlined as a data URL; if the download fails, only the
/// media placeholder is stored.
pub async fn post_webhook(
    State(state): State<GatewayState>,
    Path(channel): Path<String>,
    Json(payload): Json<WebhookPayload>,
) -> Response {
    let Some(route) = state.channel(&channel) else {
        return unknown_channel(&channel);
    };

    if payload.session_id.trim().is_empty() {
        return bad_request("session_id must not be empty");
    }

    let text = payload
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let media_url = payload
        .media_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty());

    if text.is_none() && media_url.is_none() {
        return bad_request("payload has neither text nor media");
    }

    let (message, media_base64) = if let Some(url) = media_url {
        let kind = MediaKind::from_tag(payload.media_type.as_deref());
        match state.media.download_as_base64(url).await {
            Some(data_url) => {
                let caption = text
                    .map(str::to_string)
                    .unwrap_or_else(|| kind.placeholder().to_string());
                (caption, Some(data_url))
            }
            // Download failed: keep the event as a placeholder-only row.
            None => (kind.placeholder().to_string(), None),
        }
    } else {
        // The guard above ensures text is present on this branch.
        (text.unwrap_or_default().to_string(), None)
    };

    let row = NewChannelRow {
        session_id: payload.session_id.clone(),
        message,
        sender: payload.sender.clone(),
        contact_name: payload.push_name.clone(),
        media_base64,
        created_at: payload
            .timestamp
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(now_iso),
    };

    match channel_rows::insert_channel_row(&state.db, &route.table, &row).await {
        Ok(id) => {
            tracing::debug!(channel = %channel, id, "webhook message stored");
            (StatusCode::CREATED, Json(WebhookAck { id })).into_response()
        }
        Err(e) => storage_error(e),
    }
}

/// GET /v1/channels
///
/// Lists configured channels in configuration order.
pub async fn get_channels(State(state): State<GatewayState>) -> Json<Vec<ChannelInfo>> {
    let channels = state
        .channels
        .iter()
        .map(|c| ChannelInfo {
            id: c.id.clone(),
            label: c.label.clone(),
        })
        .collect();
    Json(channels)
}

/// GET /v1/conversations/{channel}
///
/// Groups the channel's rows into conversation summaries, overlays the
/// persisted read status, and sorts newest activity first with
/// timestamp-less conversations last.
pub async fn get_conversations(
    State(state): State<GatewayState>,
    Path(channel): Path<String>,
) -> Response {
    let Some(route) = state.channel(&channel) else {
        return unknown_channel(&channel);
    };

    let rows = match channel_rows::fetch_channel_rows(&state.db, &route.table).await {
        Ok(rows) => rows,
        Err(e) => return storage_error(e),
    };
    let statuses = match conversation_state::all_conversation_statuses(&state.db).await {
        Ok(statuses) => statuses,
        Err(e) => return storage_error(e),
    };

    let mut summaries = group_by_contact(&rows, &route.id, &state.resolver);
    for summary in &mut summaries {
        if let Some(status) = statuses.get(&summary.id) {
            summary.status = *status;
        }
    }

    summaries.sort_by(|a, b| match (&a.last_message_at, &b.last_message_at) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    Json(summaries).into_response()
}

/// GET /v1/conversations/{channel}/{phone}/messages
///
/// Messages of one conversation, in storage order: rows whose extracted
/// phone matches the path, run through the parsing pipeline.
pub async fn get_messages(
    State(state): State<GatewayState>,
    Path((channel, phone)): Path<(String, String)>,
) -> Response {
    let Some(route) = state.channel(&channel) else {
        return unknown_channel(&channel);
    };

    let rows = match channel_rows::fetch_channel_rows(&state.db, &route.table).await {
        Ok(rows) => rows,
        Err(e) => return storage_error(e),
    };

    let selected: Vec<_> = rows
        .into_iter()
        .filter(|row| extract_phone(&row.session_id) == phone)
        .collect();

    let converter = MessageConverter::new(route.rules.clone(), Arc::clone(&state.resolver));
    Json(converter.convert_rows(&selected)).into_response()
}

/// POST /v1/conversations/{id}/status
///
/// Persists the read state for a conversation id. The id need not exist
/// yet; marking ahead of the next grouping pass is allowed.
pub async fn post_status(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Response {
    match conversation_state::set_conversation_status(&state.db, &id, update.status).await {
        Ok(()) => (
            StatusCode::OK,
            Json(StatusAck {
                id,
                status: update.status,
            }),
        )
            .into_response(),
        Err(e) => storage_error(e),
    }
}

/// GET /health
///
/// Unauthenticated liveness endpoint.
pub async fn get_public_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
