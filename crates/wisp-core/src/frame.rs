// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire frames exchanged over the WebSocket.
//!
//! The backend speaks duck-typed JSON objects: a frame is recognized by
//! which fields are present, and one object can satisfy several
//! predicates at once. [`InboundFrame::decode`] performs that
//! classification exactly once, in a fixed priority order, so downstream
//! code matches on a closed set of variants instead of re-testing
//! optional fields.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::types::{Attachment, ContactInfo, DeliveryStatus, MessageId, Sender};

/// Presence status carried by the outbound presence frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Offline,
}

/// A frame the client sends to the backend.
///
/// Serializes to the exact field layout the backend expects; the enum is
/// untagged because the wire format has no discriminator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundFrame {
    /// A chat message composed by the user.
    Chat {
        message: String,
        sender: Sender,
        message_id: MessageId,
    },
    /// Debounced typing indicator.
    Typing {
        typing: bool,
        content: String,
        sender: Sender,
    },
    /// Acknowledges that an inbound message was seen.
    Seen {
        status: DeliveryStatus,
        message_id: MessageId,
        sender: Sender,
    },
    /// Contact details submitted through the user-info form.
    FormData {
        form_data: ContactInfo,
        sender: Sender,
        message_id: MessageId,
    },
    /// Notice that a file finished uploading to external storage.
    FileNotice {
        file_url: String,
        file_name: String,
        sender: Sender,
        message_id: MessageId,
    },
    /// Best-effort presence signal, sent on open and on teardown.
    Presence {
        #[serde(rename = "type")]
        kind: &'static str,
        status: PresenceStatus,
        sender: Sender,
    },
}

impl OutboundFrame {
    /// Builds a chat frame for a locally composed message.
    pub fn chat(message: impl Into<String>, message_id: MessageId) -> Self {
        OutboundFrame::Chat {
            message: message.into(),
            sender: Sender::User,
            message_id,
        }
    }

    /// Builds a typing frame; `content` is the current input text.
    pub fn typing(typing: bool, content: impl Into<String>) -> Self {
        OutboundFrame::Typing {
            typing,
            content: content.into(),
            sender: Sender::User,
        }
    }

    /// Builds the seen acknowledgement for an inbound message id.
    pub fn seen(message_id: MessageId) -> Self {
        OutboundFrame::Seen {
            status: DeliveryStatus::Seen,
            message_id,
            sender: Sender::User,
        }
    }

    /// Builds the form submission frame.
    pub fn form_data(contact: ContactInfo, message_id: MessageId) -> Self {
        OutboundFrame::FormData {
            form_data: contact,
            sender: Sender::User,
            message_id,
        }
    }

    /// Builds the uploaded-file notice frame.
    pub fn file_notice(
        file_url: impl Into<String>,
        file_name: impl Into<String>,
        message_id: MessageId,
    ) -> Self {
        OutboundFrame::FileNotice {
            file_url: file_url.into(),
            file_name: file_name.into(),
            sender: Sender::User,
            message_id,
        }
    }

    /// Builds a presence frame.
    pub fn presence(status: PresenceStatus) -> Self {
        OutboundFrame::Presence {
            kind: "presence",
            status,
            sender: Sender::User,
        }
    }

    /// Serializes the frame to its wire representation.
    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A frame received from the backend, already classified.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// Remote participant started or stopped typing.
    Typing { sender: Sender, active: bool },
    /// Backend asked the client to collect contact info.
    FormTrigger,
    /// Backend confirmed receipt of the contact form; resume normal chat.
    FormAck,
    /// Delivery-state update for a message id.
    StatusUpdate {
        message_id: MessageId,
        status: DeliveryStatus,
    },
    /// Backend-reported error; surfaced as a System notice only.
    ErrorNotice { detail: String },
    /// Presence or agent lifecycle event (`agent_assigned`, ...).
    AgentEvent {
        kind: String,
        agent_name: Option<String>,
    },
    /// Quick-reply suggestions for the user.
    QuickReplies { replies: Vec<String> },
    /// An actual chat message (new content or an echo of a local send).
    Chat {
        message_id: Option<MessageId>,
        sender: Sender,
        body: Option<String>,
        attachment: Option<Attachment>,
        timestamp: Option<DateTime<Utc>>,
    },
    /// Matched no predicate; logged and dropped by the dispatcher.
    Unknown,
}

impl InboundFrame {
    /// Parses raw frame text and classifies it.
    ///
    /// `trigger_phrases` feed the form-trigger predicate: a chat body that
    /// contains one of them (case-insensitively) is treated as a request
    /// to collect contact info.
    pub fn decode(raw: &str, trigger_phrases: &[String]) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(raw)?;
        Ok(Self::classify(&value, trigger_phrases))
    }

    /// Classifies a parsed frame. First match wins; the order is part of
    /// the contract because one frame can satisfy several predicates.
    pub fn classify(value: &Value, trigger_phrases: &[String]) -> Self {
        let sender = parse_sender(value);

        // 1. Typing notice. Our own echoed typing frames fall through and
        //    end up dropped as Unknown.
        if let Some(active) = value.get("typing").and_then(Value::as_bool) {
            if sender != Sender::User {
                return InboundFrame::Typing { sender, active };
            }
            return InboundFrame::Unknown;
        }

        // 2. Form trigger: explicit flag, or a body matching a configured
        //    trigger phrase.
        let explicit_form = value.get("show_form").and_then(Value::as_bool) == Some(true)
            && value.get("form_type").and_then(Value::as_str) == Some("user_info");
        let phrase_form = value
            .get("message")
            .and_then(Value::as_str)
            .is_some_and(|body| body_matches_trigger(body, trigger_phrases));
        if explicit_form || phrase_form {
            return InboundFrame::FormTrigger;
        }

        // 3. Form acknowledgement.
        if value.get("form_data_received").and_then(Value::as_bool) == Some(true) {
            return InboundFrame::FormAck;
        }

        // 4. Status update. The backend's chat broadcast carries a
        //    `status` alongside its content; only the content-free form
        //    is a bare update, the rest must reach the chat branch.
        let has_content = value.get("message").is_some() || value.get("file_url").is_some();
        if !has_content {
            if let Some(status) = value
                .get("status")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<DeliveryStatus>().ok())
            {
                if let Some(id) = value.get("message_id").and_then(Value::as_str) {
                    return InboundFrame::StatusUpdate {
                        message_id: MessageId(id.to_string()),
                        status,
                    };
                }
                return InboundFrame::Unknown;
            }
        }

        // 5. Backend error.
        if let Some(detail) = value.get("error").and_then(Value::as_str) {
            return InboundFrame::ErrorNotice {
                detail: detail.to_string(),
            };
        }

        // 6. Presence / agent event.
        if let Some(kind) = value.get("type").and_then(Value::as_str) {
            return InboundFrame::AgentEvent {
                kind: kind.to_string(),
                agent_name: value
                    .get("agent_name")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            };
        }

        // 7. Quick-reply suggestions.
        if let Some(replies) = value.get("suggested_replies").and_then(Value::as_array) {
            return InboundFrame::QuickReplies {
                replies: replies
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            };
        }

        // 8. Chat message.
        let body = value
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string);
        let attachment = value
            .get("file_url")
            .and_then(Value::as_str)
            .map(|url| Attachment {
                url: url.to_string(),
                name: value
                    .get("file_name")
                    .and_then(Value::as_str)
                    .unwrap_or("file")
                    .to_string(),
                size: None,
            });
        if body.is_some() || attachment.is_some() {
            return InboundFrame::Chat {
                message_id: value
                    .get("message_id")
                    .and_then(Value::as_str)
                    .map(|id| MessageId(id.to_string())),
                sender,
                body,
                attachment,
                timestamp: value
                    .get("timestamp")
                    .and_then(Value::as_str)
                    .and_then(|ts| ts.parse::<DateTime<Utc>>().ok()),
            };
        }

        InboundFrame::Unknown
    }
}

fn parse_sender(value: &Value) -> Sender {
    match value.get("sender").and_then(Value::as_str) {
        Some("User") => Sender::User,
        Some("System") => Sender::System,
        Some(_) => Sender::Agent,
        None => Sender::Agent,
    }
}

fn body_matches_trigger(body: &str, trigger_phrases: &[String]) -> bool {
    let lowered = body.to_lowercase();
    trigger_phrases
        .iter()
        .any(|p| !p.is_empty() && lowered.contains(&p.to_lowercase()))
}
