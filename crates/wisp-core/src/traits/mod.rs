// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the seams between Wisp and its collaborators.

pub mod state;
pub mod transport;

pub use state::ClientStateStore;
pub use transport::{SocketPair, SocketSink, SocketStream, SocketTransport};
