// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound frame dispatching.
//!
//! Decodes a raw socket frame, classifies it, and folds it into the
//! message store, emitting the outcomes the session turns into UI events
//! and outbound traffic. Malformed frames are logged and dropped; they
//! never tear down the connection.

use std::collections::HashSet;

use tracing::{debug, warn};
use wisp_core::frame::{InboundFrame, OutboundFrame};
use wisp_core::types::{ChatMessage, DeliveryStatus, MessageId, Sender};

use crate::store::MessageStore;

/// What the session should do in response to one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Show or clear a remote typing indicator.
    TypingNotice { sender: Sender, active: bool },
    /// Switch the UI into contact-form mode.
    ShowContactForm,
    /// Contact form acknowledged; switch back to chat mode.
    ResumeChat,
    /// Surface a system-level notice line.
    SystemNotice(String),
    /// A message was inserted or updated in the store.
    MessageUpserted(ChatMessage),
    /// Play the notification cue for new remote content.
    Notify,
    /// Transmit a frame (seen acknowledgements).
    SendFrame(OutboundFrame),
    /// Offer quick-reply suggestions.
    QuickReplies(Vec<String>),
}

/// Classifies inbound frames and tracks which ids were already
/// seen-acknowledged, so each remote message is acked exactly once even
/// if the backend redelivers it.
pub struct InboundDispatcher {
    trigger_phrases: Vec<String>,
    seen_acked: HashSet<MessageId>,
}

impl InboundDispatcher {
    pub fn new(trigger_phrases: Vec<String>) -> Self {
        Self {
            trigger_phrases,
            seen_acked: HashSet::new(),
        }
    }

    /// Processes one raw frame. Returns the outcomes in the order the
    /// session should apply them.
    pub fn dispatch(&mut self, raw: &str, store: &mut MessageStore) -> Vec<DispatchOutcome> {
        let frame = match InboundFrame::decode(raw, &self.trigger_phrases) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(error = %err, "dropping malformed frame");
                return Vec::new();
            }
        };

        match frame {
            InboundFrame::Typing { sender, active } => {
                vec![DispatchOutcome::TypingNotice { sender, active }]
            }
            InboundFrame::FormTrigger => vec![DispatchOutcome::ShowContactForm],
            InboundFrame::FormAck => vec![DispatchOutcome::ResumeChat],
            InboundFrame::StatusUpdate { message_id, status } => {
                match store.apply_server_update(&message_id, Sender::System, status, None, None, None)
                {
                    Some(message) => vec![DispatchOutcome::MessageUpserted(message.clone())],
                    None => {
                        debug!(message_id = %message_id, "status update for unknown id dropped");
                        Vec::new()
                    }
                }
            }
            InboundFrame::ErrorNotice { detail } => {
                warn!(detail = %detail, "backend reported an error");
                vec![DispatchOutcome::SystemNotice(detail)]
            }
            InboundFrame::AgentEvent { kind, agent_name } => {
                let notice = match (kind.as_str(), agent_name) {
                    ("agent_assigned", Some(name)) => format!("{name} joined the conversation"),
                    ("agent_assigned", None) => "An agent joined the conversation".to_string(),
                    (_, Some(name)) => format!("{name}: {kind}"),
                    (_, None) => kind,
                };
                vec![DispatchOutcome::SystemNotice(notice)]
            }
            InboundFrame::QuickReplies { replies } => {
                vec![DispatchOutcome::QuickReplies(replies)]
            }
            InboundFrame::Chat {
                message_id,
                sender,
                body,
                attachment,
                timestamp,
            } => {
                let id = message_id.unwrap_or_else(MessageId::generate);
                let Some(message) = store
                    .apply_server_update(
                        &id,
                        sender,
                        DeliveryStatus::Delivered,
                        body,
                        attachment,
                        timestamp,
                    )
                    .cloned()
                else {
                    debug!(message_id = %id, "chat frame carried no content");
                    return Vec::new();
                };

                let mut outcomes = vec![DispatchOutcome::MessageUpserted(message)];
                // Remote content gets a seen ack and the notification
                // cue, once per id; echoes of local sends get neither.
                if sender != Sender::User && self.seen_acked.insert(id.clone()) {
                    outcomes.push(DispatchOutcome::SendFrame(OutboundFrame::seen(id)));
                    outcomes.push(DispatchOutcome::Notify);
                }
                outcomes
            }
            InboundFrame::Unknown => {
                debug!(frame = raw, "unclassified frame dropped");
                Vec::new()
            }
        }
    }
}
