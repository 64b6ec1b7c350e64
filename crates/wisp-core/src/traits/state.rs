// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted client state seam.
//!
//! The original widget keeps a handful of plain string key-values in
//! browser localStorage; this trait is that storage's analog. Read at
//! init, written on change, no schema versioning. Eviction is out of
//! scope: nothing here ever deletes a key.

use crate::error::WispError;

/// Key for the persisted room identifier.
pub const ROOM_ID_KEY: &str = "chat_room_id";
/// Key for the persisted widget identifier.
pub const WIDGET_ID_KEY: &str = "chat_widget_id";
/// Key for the persisted history limit preference.
pub const HISTORY_LIMIT_KEY: &str = "chat_history_limit";

/// Simple persistent string key-value storage.
pub trait ClientStateStore: Send + Sync {
    /// Returns the stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, overwriting any prior value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), WispError>;
}
