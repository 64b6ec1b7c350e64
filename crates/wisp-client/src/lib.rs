// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection and message-lifecycle management for the Wisp chat client.
//!
//! The entry point is [`session::WidgetSession`]: open a session against
//! a configured backend, then drive it with [`session::SessionCommand`]s
//! and render the [`session::UiEvent`]s it emits. The remaining modules
//! are its parts: the message [`store`], the socket [`connection`] with
//! bounded-backoff reconnection, outbound [`typing`] debounce, one-shot
//! [`history`] hydration, and the inbound frame [`dispatch`]er.

pub mod connection;
pub mod dispatch;
pub mod history;
pub mod rest;
pub mod session;
pub mod state;
pub mod store;
pub mod transport;
pub mod typing;

pub use connection::{ConnectionManager, ReconnectDecision, SocketEvent};
pub use dispatch::{DispatchOutcome, InboundDispatcher};
pub use history::{HistoryLimit, HistoryLoader};
pub use rest::RestClient;
pub use session::{SessionCommand, UiEvent, WidgetSession};
pub use state::FileStateStore;
pub use store::MessageStore;
pub use transport::TungsteniteTransport;
pub use typing::TypingDebouncer;
