// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory state store for tests.

use std::collections::HashMap;

use wisp_core::error::WispError;
use wisp_core::traits::state::ClientStateStore;

/// `ClientStateStore` backed by a plain map. Nothing persists.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    values: HashMap<String, String>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeds entries, for tests that start with persisted state.
    pub fn seeded<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ClientStateStore for MemoryStateStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), WispError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
