// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Wisp chat client.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Wisp configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to values
/// that point at a local development backend.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WispConfig {
    /// Widget identity and backend endpoints.
    #[serde(default)]
    pub widget: WidgetConfig,

    /// WebSocket reconnection behavior.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// History replay settings.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Typing indicator debounce settings.
    #[serde(default)]
    pub typing: TypingConfig,

    /// Client process settings.
    #[serde(default)]
    pub client: ClientConfig,
}

/// Widget identity and the external collaborator endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WidgetConfig {
    /// Widget identity, supplied by the backend operator.
    /// `None` means the client cannot open a session.
    #[serde(default)]
    pub widget_id: Option<String>,

    /// Room-creation REST endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// WebSocket base URL; the room id is appended when dialing.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// Chat-history REST endpoint.
    #[serde(default = "default_history_url")]
    pub history_url: String,

    /// Multipart file-upload REST endpoint.
    #[serde(default = "default_file_upload_url")]
    pub file_upload_url: String,

    /// Phrases that switch the UI into contact-info collection when they
    /// appear (case-insensitively) in an inbound message body.
    #[serde(default = "default_trigger_phrases")]
    pub trigger_phrases: Vec<String>,

    /// Client IP reported in the room-creation payload. The lookup
    /// service is an external collaborator; when unset, "unknown" is sent.
    #[serde(default)]
    pub user_ip: Option<String>,

    /// User agent reported in the room-creation payload.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Upper bound on attachment size, enforced before any upload.
    #[serde(default = "default_max_file_size_bytes")]
    pub max_file_size_bytes: u64,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            widget_id: None,
            api_url: default_api_url(),
            ws_url: default_ws_url(),
            history_url: default_history_url(),
            file_upload_url: default_file_upload_url(),
            trigger_phrases: default_trigger_phrases(),
            user_ip: None,
            user_agent: default_user_agent(),
            max_file_size_bytes: default_max_file_size_bytes(),
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:8000/chat/user-chat/".to_string()
}

fn default_ws_url() -> String {
    "ws://localhost:8000/ws/chat/".to_string()
}

fn default_history_url() -> String {
    "http://localhost:8000/chat/chat-history/".to_string()
}

fn default_file_upload_url() -> String {
    "http://localhost:8000/chat/user-chat/upload-file/".to_string()
}

fn default_trigger_phrases() -> Vec<String> {
    vec![
        "talk to a human".to_string(),
        "speak to an agent".to_string(),
    ]
}

fn default_user_agent() -> String {
    concat!("wisp/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_max_file_size_bytes() -> u64 {
    10 * 1024 * 1024
}

/// WebSocket reconnection behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Base reconnect delay; attempt `n` waits `base * 2^n`.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Reconnect attempts before the connection is terminally closed.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_base_delay_ms() -> u64 {
    3000
}

fn default_max_attempts() -> u32 {
    5
}

/// History replay settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Default message count replayed on first open: "5", "10", or "all".
    /// Overridden by the persisted `chat_history_limit` preference.
    #[serde(default = "default_history_limit")]
    pub default_limit: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_history_limit(),
        }
    }
}

fn default_history_limit() -> String {
    "10".to_string()
}

/// Typing indicator debounce settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TypingConfig {
    /// Minimum spacing between outbound typing frames.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Idle window after which a trailing `typing: false` is sent, and
    /// after which a remote typing notice expires if not refreshed.
    #[serde(default = "default_idle_expire_ms")]
    pub idle_expire_ms: u64,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            idle_expire_ms: default_idle_expire_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_idle_expire_ms() -> u64 {
    2500
}

/// Client process settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
