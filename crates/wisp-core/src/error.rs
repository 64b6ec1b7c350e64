// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Wisp chat client.

use thiserror::Error;

/// The primary error type used across all Wisp crates.
#[derive(Debug, Error)]
pub enum WispError {
    /// Configuration errors (invalid TOML, missing required fields, bad URLs).
    #[error("configuration error: {0}")]
    Config(String),

    /// REST collaborator errors (room creation, history fetch, file upload).
    #[error("http error: {message}")]
    Http {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// WebSocket transport errors (dial failure, send failure, protocol error).
    #[error("socket error: {message}")]
    Socket {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An outbound frame was attempted while the connection was not open.
    /// Sends are fire-and-forget: the caller surfaces this to the user
    /// instead of queueing the frame.
    #[error("not connected")]
    NotConnected,

    /// Client-side input validation failure (invalid email, oversized file).
    #[error("validation error: {0}")]
    Validation(String),

    /// Persisted client state errors (state file unreadable or unwritable).
    #[error("state store error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
