// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable client state: room id, widget id, history limit.
//!
//! A small TOML table rewritten whole on every set. Lives under the
//! platform data dir by default; tests point it at a temp file.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};
use wisp_core::error::WispError;
use wisp_core::traits::state::ClientStateStore;

pub struct FileStateStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStateStore {
    /// Opens the default store at `<data_dir>/wisp/state.toml`.
    pub fn open_default() -> Result<Self, WispError> {
        let base = dirs::data_dir()
            .ok_or_else(|| WispError::Config("no data directory on this platform".into()))?;
        Self::open(base.join("wisp").join("state.toml"))
    }

    /// Opens (or initializes) the store at `path`. A missing file is an
    /// empty store; a corrupt file is discarded with a warning rather
    /// than wedging startup.
    pub fn open(path: PathBuf) -> Result<Self, WispError> {
        let values = match fs::read_to_string(&path) {
            Ok(raw) => match toml::from_str(&raw) {
                Ok(values) => values,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "discarding corrupt state file");
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(WispError::Storage {
                    source: Box::new(err),
                })
            }
        };
        debug!(path = %path.display(), entries = values.len(), "state store opened");
        Ok(Self { path, values })
    }

    fn persist(&self) -> Result<(), WispError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| WispError::Storage {
                source: Box::new(err),
            })?;
        }
        let raw = toml::to_string(&self.values)
            .map_err(|err| WispError::Internal(format!("state serialization failed: {err}")))?;
        fs::write(&self.path, raw).map_err(|err| WispError::Storage {
            source: Box::new(err),
        })
    }
}

impl ClientStateStore for FileStateStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), WispError> {
        self.values.insert(key.to_string(), value.to_string());
        self.persist()
    }
}
