// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Wisp chat client.
//!
//! This crate provides the foundational error type, domain types, wire
//! frame definitions, and trait seams used throughout the Wisp
//! workspace. The actual connection and message-lifecycle machinery
//! lives in `wisp-client`.

pub mod error;
pub mod frame;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::WispError;
pub use frame::{InboundFrame, OutboundFrame, PresenceStatus};
pub use types::{
    Attachment, ChatMessage, ConnectionState, ContactInfo, DeliveryStatus, MessageId, RoomId,
    Sender, WidgetId,
};

pub use traits::{ClientStateStore, SocketPair, SocketSink, SocketStream, SocketTransport};
