// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory message store keyed by client-generated message ids.
//!
//! The store is the single owner of message delivery state: at most one
//! record exists per id, later updates mutate in place, and status moves
//! monotonically through pending -> sent -> delivered -> seen. All
//! mutation happens through the methods here, from the session's single
//! task.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;
use wisp_core::error::WispError;
use wisp_core::types::{Attachment, ChatMessage, DeliveryStatus, MessageId, Sender};

/// In-memory mapping of message ids to delivery state.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: HashMap<MessageId, ChatMessage>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a locally composed message: fresh id, status pending,
    /// sender User. The record is retained in the store.
    ///
    /// At least one of `body` / `attachment` must carry content.
    pub fn create(
        &mut self,
        body: Option<String>,
        attachment: Option<Attachment>,
    ) -> Result<ChatMessage, WispError> {
        let message = ChatMessage {
            id: MessageId::generate(),
            sender: Sender::User,
            body,
            attachment,
            status: DeliveryStatus::Pending,
            timestamp: Utc::now(),
        };
        if !message.has_content() {
            return Err(WispError::Validation(
                "a message needs text or an attachment".into(),
            ));
        }
        self.messages.insert(message.id.clone(), message.clone());
        Ok(message)
    }

    /// Applies a server-originated update for `id`.
    ///
    /// Known id: the status is raised monotonically (an out-of-order
    /// "delivered" after "seen" is ignored) and content is replaced when
    /// the update carries any, which is how history replay delivers
    /// authoritative content for a locally pending id. Unknown id with
    /// content: inserted as a new record, covering agent and system
    /// messages that never originated locally. Unknown id without
    /// content: dropped (a bare status frame cannot become a record).
    #[allow(clippy::too_many_arguments)]
    pub fn apply_server_update(
        &mut self,
        id: &MessageId,
        sender: Sender,
        status: DeliveryStatus,
        body: Option<String>,
        attachment: Option<Attachment>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Option<&ChatMessage> {
        if let Some(existing) = self.messages.get_mut(id) {
            if status > existing.status {
                existing.status = status;
            }
            if body.is_some() {
                existing.body = body;
            }
            if attachment.is_some() {
                existing.attachment = attachment;
            }
            if let Some(ts) = timestamp {
                existing.timestamp = ts;
            }
            return self.messages.get(id);
        }

        let message = ChatMessage {
            id: id.clone(),
            sender,
            body,
            attachment,
            status,
            timestamp: timestamp.unwrap_or_else(Utc::now),
        };
        if !message.has_content() {
            debug!(message_id = %id, "dropping status update for unknown id");
            return None;
        }
        self.messages.insert(id.clone(), message);
        self.messages.get(id)
    }

    /// Raises the status of a known message locally (pending -> sent on
    /// successful transmit). Never regresses.
    pub fn advance_status(
        &mut self,
        id: &MessageId,
        status: DeliveryStatus,
    ) -> Option<&ChatMessage> {
        let existing = self.messages.get_mut(id)?;
        if status > existing.status {
            existing.status = status;
        }
        self.messages.get(id)
    }

    /// True when `id` is already tracked. The dispatcher uses this to
    /// tell an echo of a local send from genuinely new inbound content.
    pub fn exists(&self, id: &MessageId) -> bool {
        self.messages.contains_key(id)
    }

    pub fn get(&self, id: &MessageId) -> Option<&ChatMessage> {
        self.messages.get(id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
