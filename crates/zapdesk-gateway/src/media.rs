// SPDX-FileCopyrightText: 2026 Zapdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media download for webhook intake.
//!
//! Fetches a media URL and inlines it as a `data:` URL for storage in the
//! channel table. Media is best-effort: any network, status, or size
//! failure logs a warning and yields `None`, and the webhook stores a
//! placeholder message instead.

use std::time::Duration;

use tracing::{debug, warn};
use zapdesk_core::ZapdeskError;

/// Broad media category, used to pick the placeholder message text shown
/// in the conversation list when a message has no caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
    Video,
    Sticker,
    Document,
}

impl MediaKind {
    /// Classify a webhook `media_type` tag.
    ///
    /// Accepts both bare tags (`"image"`, `"ptt"`) and full MIME types
    /// (`"image/jpeg"`); anything unrecognized is a document.
    pub fn from_tag(tag: Option<&str>) -> Self {
        let Some(tag) = tag else {
            return MediaKind::Document;
        };
        let normalized = tag.trim().to_ascii_lowercase();
        let prefix = normalized.split('/').next().unwrap_or(&normalized);
        match prefix {
            "image" | "imagem" => MediaKind::Image,
            "audio" | "ptt" | "voice" => MediaKind::Audio,
            "video" => MediaKind::Video,
            "sticker" => MediaKind::Sticker,
            _ => MediaKind::Document,
        }
    }

    /// Placeholder stored as the message body for caption-less media.
    pub fn placeholder(self) -> &'static str {
        match self {
            MediaKind::Image => "[Image]",
            MediaKind::Audio => "[Audio]",
            MediaKind::Video => "[Video]",
            MediaKind::Sticker => "[Sticker]",
            MediaKind::Document => "[Document]",
        }
    }
}

/// Downloads webhook media and encodes it as a `data:` URL.
#[derive(Clone)]
pub struct MediaFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl MediaFetcher {
    /// Create a fetcher with a request timeout and a body size cap.
    pub fn new(timeout: Duration, max_bytes: usize) -> Result<Self, ZapdeskError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ZapdeskError::Gateway {
                message: format!("failed to create media client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self { client, max_bytes })
    }

    /// Fetch `url` and return `data:<content-type>;base64,<payload>`.
    ///
    /// The content type comes from the response header, parameters
    /// stripped, defaulting to `application/octet-stream`. An oversized
    /// body is dropped, not truncated. All failures return `None`.
    pub async fn download_as_base64(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url, error = %e, "media download failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = %status, "media download returned non-success status");
            return None;
        }

        // Read the header before bytes() consumes the response.
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(url, error = %e, "failed to read media body");
                return None;
            }
        };

        if bytes.len() > self.max_bytes {
            warn!(
                url,
                size = bytes.len(),
                limit = self.max_bytes,
                "media exceeds size limit"
            );
            return None;
        }

        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        debug!(url, size = bytes.len(), content_type, "downloaded media");
        Some(format!("data:{content_type};base64,{encoded}"))
    }
}
