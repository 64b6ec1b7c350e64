// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Socket transport seam.
//!
//! The connection manager owns exactly one live socket at a time; this
//! trait is the only way it obtains one. Production uses the
//! tokio-tungstenite transport in `wisp-client`; tests use the scripted
//! mock in `wisp-test-utils`.

use async_trait::async_trait;

use crate::error::WispError;

/// Write and read halves of a freshly dialed socket.
///
/// The halves are split so the connection manager can keep the sink while
/// a spawned reader task drains the stream.
pub type SocketPair = (Box<dyn SocketSink>, Box<dyn SocketStream>);

/// Dials WebSocket connections.
#[async_trait]
pub trait SocketTransport: Send + Sync {
    /// Opens a socket to `url` and returns its split halves.
    async fn connect(&self, url: &str) -> Result<SocketPair, WispError>;
}

/// The write half of a socket.
#[async_trait]
pub trait SocketSink: Send + Sync {
    /// Transmits one text frame.
    async fn send_text(&mut self, text: String) -> Result<(), WispError>;

    /// Closes the socket. Best-effort; errors are swallowed by callers.
    async fn close(&mut self);
}

/// The read half of a socket. `None` means the peer closed.
#[async_trait]
pub trait SocketStream: Send {
    async fn next_text(&mut self) -> Option<Result<String, WispError>>;
}
