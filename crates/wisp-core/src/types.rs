// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Wisp workspace.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Server-assigned conversation identifier, shared between the widget
/// client and the agent on the other end. Immutable for the session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(pub String);

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Widget configuration identity, supplied externally. Immutable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WidgetId(pub String);

impl std::fmt::Display for WidgetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-generated opaque message identifier, stable across retries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generates a fresh id: unix millis plus a 9-character base36 suffix,
    /// enough to avoid same-millisecond collision in a single-tab client.
    pub fn generate() -> Self {
        const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
        let mut rng = rand::thread_rng();
        let suffix: String = (0..9)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        MessageId(format!("msg_{}_{suffix}", Utc::now().timestamp_millis()))
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who authored a message. `System` is synthesized locally for connection
/// and error notices; the backend never originates it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum Sender {
    User,
    System,
    /// Unrecognized remote senders decode as `Agent`.
    #[serde(other)]
    Agent,
}

/// Delivery state of a message. Monotonically non-decreasing for a given
/// id; the variant order here is the ordering contract.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Delivered,
    Seen,
}

/// A file attached to a message, already uploaded to external storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// A single chat message as tracked by the message store.
///
/// At least one of `body` / `attachment` is present; the store enforces
/// this at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender: Sender,
    pub body: Option<String>,
    pub attachment: Option<Attachment>,
    pub status: DeliveryStatus,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// True when the message carries text or an attachment.
    pub fn has_content(&self) -> bool {
        self.body.as_deref().is_some_and(|b| !b.is_empty()) || self.attachment.is_some()
    }
}

/// Contact details collected through the user-info form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub email: String,
}

/// Lifecycle state of the single WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection requested yet.
    Idle,
    /// Dialing the socket.
    Connecting,
    /// Socket is live; sends are accepted.
    Open,
    /// Socket dropped; a retry is scheduled.
    Reconnecting,
    /// Retries exhausted. Terminal and user-visible.
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Idle => write!(f, "idle"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Open => write!(f, "open"),
            ConnectionState::Reconnecting => write!(f, "reconnecting"),
            ConnectionState::Closed => write!(f, "closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_id_generate_shape() {
        let id = MessageId::generate();
        let parts: Vec<&str> = id.0.splitn(3, '_').collect();
        assert_eq!(parts[0], "msg");
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 9);
    }

    #[test]
    fn message_id_generate_is_unique_within_a_millisecond() {
        let a = MessageId::generate();
        let b = MessageId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn delivery_status_ordering_is_monotonic() {
        assert!(DeliveryStatus::Pending < DeliveryStatus::Sent);
        assert!(DeliveryStatus::Sent < DeliveryStatus::Delivered);
        assert!(DeliveryStatus::Delivered < DeliveryStatus::Seen);
    }

    #[test]
    fn delivery_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&DeliveryStatus::Seen).unwrap(),
            "\"seen\""
        );
        let parsed: DeliveryStatus = serde_json::from_str("\"delivered\"").unwrap();
        assert_eq!(parsed, DeliveryStatus::Delivered);
    }

    #[test]
    fn unknown_sender_decodes_as_agent() {
        let parsed: Sender = serde_json::from_str("\"wish-bot\"").unwrap();
        assert_eq!(parsed, Sender::Agent);
        // Named variants still match exactly.
        let user: Sender = serde_json::from_str("\"User\"").unwrap();
        assert_eq!(user, Sender::User);
        let system: Sender = serde_json::from_str("\"System\"").unwrap();
        assert_eq!(system, Sender::System);
    }

    #[test]
    fn connection_state_display() {
        assert_eq!(ConnectionState::Idle.to_string(), "idle");
        assert_eq!(ConnectionState::Reconnecting.to_string(), "reconnecting");
    }

    #[test]
    fn chat_message_has_content() {
        let msg = ChatMessage {
            id: MessageId("m1".into()),
            sender: Sender::User,
            body: Some("hi".into()),
            attachment: None,
            status: DeliveryStatus::Pending,
            timestamp: Utc::now(),
        };
        assert!(msg.has_content());

        let empty = ChatMessage {
            body: Some(String::new()),
            ..msg.clone()
        };
        assert!(!empty.has_content());
    }
}
