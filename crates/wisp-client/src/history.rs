// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot history hydration.
//!
//! History is fetched at most once per connected session, even when the
//! fetch fails; only a limit change (or a fresh session) re-arms the
//! loader. Fetched messages merge through the store so replayed history
//! can never regress a delivery status.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use wisp_core::error::WispError;
use wisp_core::types::{DeliveryStatus, MessageId, RoomId, WidgetId};

use crate::rest::RestClient;
use crate::store::MessageStore;

/// How much stored history to hydrate on connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryLimit {
    Five,
    #[default]
    Ten,
    Unbounded,
}

impl HistoryLimit {
    /// Persisted form, also what the config layer validates against.
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryLimit::Five => "5",
            HistoryLimit::Ten => "10",
            HistoryLimit::Unbounded => "all",
        }
    }

    /// Value sent to the history endpoint; `None` requests everything.
    pub fn request_value(self) -> Option<u32> {
        match self {
            HistoryLimit::Five => Some(5),
            HistoryLimit::Ten => Some(10),
            HistoryLimit::Unbounded => None,
        }
    }
}

impl FromStr for HistoryLimit {
    type Err = WispError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "5" => Ok(HistoryLimit::Five),
            "10" => Ok(HistoryLimit::Ten),
            "all" => Ok(HistoryLimit::Unbounded),
            other => Err(WispError::Validation(format!(
                "invalid history limit {other:?}, expected one of 5, 10, all"
            ))),
        }
    }
}

impl std::fmt::Display for HistoryLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guards the once-per-session history fetch.
#[derive(Debug, Default)]
pub struct HistoryLoader {
    loaded: bool,
}

impl HistoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Re-arms the loader so the next `load_once` fetches again. Called
    /// when the history limit changes.
    pub fn rearm(&mut self) {
        self.loaded = false;
    }

    /// Fetches history and merges it into the store, at most once. The
    /// guard is set before the fetch: a failed fetch does not retry on
    /// its own, matching the at-most-once contract.
    ///
    /// Returns the ids of messages that were inserted or updated, in
    /// server order, or `None` when the fetch was skipped.
    pub async fn load_once(
        &mut self,
        rest: &RestClient,
        room_id: &RoomId,
        widget_id: &WidgetId,
        limit: HistoryLimit,
        store: &mut MessageStore,
    ) -> Option<Result<Vec<MessageId>, WispError>> {
        if self.loaded {
            debug!("history already hydrated this session");
            return None;
        }
        self.loaded = true;

        let messages = match rest.fetch_history(room_id, widget_id, limit).await {
            Ok(messages) => messages,
            Err(err) => {
                warn!(error = %err, "history fetch failed");
                return Some(Err(err));
            }
        };

        let mut touched = Vec::with_capacity(messages.len());
        for entry in messages {
            let id = entry
                .message_id
                .clone()
                .map(MessageId)
                .unwrap_or_else(MessageId::generate);
            let status = entry.status.unwrap_or(DeliveryStatus::Delivered);
            let attachment = entry.attachment();
            let timestamp = entry
                .timestamp
                .as_deref()
                .and_then(parse_timestamp);
            if let Some(message) = store.apply_server_update(
                &id,
                entry.sender,
                status,
                entry.message.clone(),
                attachment,
                timestamp,
            ) {
                touched.push(message.id.clone());
            }
        }
        info!(count = touched.len(), limit = %limit, "history hydrated");
        Some(Ok(touched))
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
