//! Persistence adapter
//!
//! Serializes queue and transport state to key/value device storage and
//! reads it back on startup. Durability is best-effort: read failures reset
//! to defaults and write failures are logged, never surfaced.
//!
//! Keys (with the default `player-` prefix):
//! - `player-queue`: JSON array of queue items
//! - `player-queue-index`: cursor as a decimal string
//! - `player-settings`: volume, mute, repeat and shuffle flags
//! - `player-current-track`: snapshot of the loaded track

use crate::error::{Result, StorageError};
use crate::queue::QueueEngine;
use crate::transport::TransportState;
use crate::types::{QueueItem, RepeatMode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const QUEUE_KEY: &str = "queue";
const INDEX_KEY: &str = "queue-index";
const SETTINGS_KEY: &str = "settings";
const CURRENT_TRACK_KEY: &str = "current-track";

/// Keys left behind by the old two-list shuffle
const LEGACY_KEYS: [&str; 2] = ["original-queue", "is-shuffled"];

/// Durable string key/value storage on the device
pub trait DeviceStorage {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), StorageError>;

    /// Remove a key (absent keys are not an error)
    fn remove(&mut self, key: &str) -> std::result::Result<(), StorageError>;
}

/// In-memory storage, optionally with a byte quota
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects writes once `bytes` of values are stored
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn used_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(_, v)| v.len())
            .sum()
    }
}

impl DeviceStorage for MemoryStorage {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), StorageError> {
        if let Some(quota) = self.quota {
            if self.used_without(key) + value.len() > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> std::result::Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Storage keeping one file per key in a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a storage directory
    pub fn open(root: impl AsRef<Path>) -> std::result::Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> std::result::Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::Unavailable(format!("invalid key: {}", key)));
        }
        Ok(self.root.join(key))
    }
}

impl DeviceStorage for FileStorage {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), StorageError> {
        std::fs::write(self.path_for(key)?, value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> std::result::Result<(), StorageError> {
        match std::fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Persisted transport settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSettings {
    pub volume: u8,
    pub muted: bool,
    pub repeat_mode: RepeatMode,
    pub shuffle_enabled: bool,
}

impl PlayerSettings {
    pub fn from_state(state: &TransportState) -> Self {
        Self {
            volume: state.volume,
            muted: state.muted,
            repeat_mode: state.repeat_mode,
            shuffle_enabled: state.shuffle_enabled,
        }
    }
}

/// Everything read back by [`PlaybackStore::restore`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoredState {
    /// Empty when nothing (valid) was stored
    pub items: Vec<QueueItem>,

    /// Stored cursor, if it parsed
    pub position: Option<usize>,

    /// `None` means use defaults
    pub settings: Option<PlayerSettings>,

    pub current_track: Option<QueueItem>,
}

/// Reads and writes playback state through a [`DeviceStorage`]
pub struct PlaybackStore {
    storage: Box<dyn DeviceStorage>,
    prefix: String,
}

impl PlaybackStore {
    pub fn new(storage: Box<dyn DeviceStorage>, prefix: impl Into<String>) -> Self {
        Self {
            storage,
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Write the full state, logging (not returning) failures
    pub fn save(&mut self, queue: &QueueEngine, transport: &TransportState) {
        if let Err(e) = self.try_save(queue, transport) {
            warn!(error = %e, "Failed to persist playback state");
        }
    }

    /// Write the full state
    ///
    /// An empty queue removes the stored queue keys instead of writing `[]`.
    pub fn try_save(&mut self, queue: &QueueEngine, transport: &TransportState) -> Result<()> {
        if queue.is_empty() {
            self.clear_queue()?;
        } else {
            self.save_queue(queue)?;
        }
        self.save_settings(&PlayerSettings::from_state(transport))?;
        self.save_current_track(transport.current_track.as_ref())?;
        Ok(())
    }

    pub fn save_queue(&mut self, queue: &QueueEngine) -> Result<()> {
        let json = serde_json::to_string(queue.items())?;
        self.set(QUEUE_KEY, &json)?;
        self.set(INDEX_KEY, &queue.position().to_string())?;
        debug!(len = queue.len(), position = queue.position(), "Saved queue");
        Ok(())
    }

    pub fn save_settings(&mut self, settings: &PlayerSettings) -> Result<()> {
        let json = serde_json::to_string(settings)?;
        self.set(SETTINGS_KEY, &json)
    }

    pub fn save_current_track(&mut self, item: Option<&QueueItem>) -> Result<()> {
        match item {
            Some(item) => {
                let json = serde_json::to_string(item)?;
                self.set(CURRENT_TRACK_KEY, &json)
            }
            None => self.remove(CURRENT_TRACK_KEY),
        }
    }

    /// Remove the stored queue and cursor
    pub fn clear_queue(&mut self) -> Result<()> {
        self.remove(QUEUE_KEY)?;
        self.remove(INDEX_KEY)?;
        debug!("Cleared stored queue");
        Ok(())
    }

    /// Read back stored state
    ///
    /// Never fails: unreadable or malformed entries are logged and treated
    /// as absent. A malformed queue also discards the stored cursor.
    pub fn restore(&mut self) -> RestoredState {
        for name in LEGACY_KEYS {
            if let Err(e) = self.remove(name) {
                debug!(key = %self.key(name), error = %e, "Could not remove legacy key");
            }
        }

        let mut restored = RestoredState::default();

        match self.read_json::<Vec<QueueItem>>(QUEUE_KEY) {
            Ok(Some(items)) => {
                restored.items = items;
                restored.position = self.read_index();
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Stored queue unreadable, starting empty"),
        }

        match self.read_json::<PlayerSettings>(SETTINGS_KEY) {
            Ok(settings) => restored.settings = settings,
            Err(e) => warn!(error = %e, "Stored settings unreadable, using defaults"),
        }

        match self.read_json::<QueueItem>(CURRENT_TRACK_KEY) {
            Ok(item) => restored.current_track = item,
            Err(e) => warn!(error = %e, "Stored current track unreadable"),
        }

        info!(
            len = restored.items.len(),
            position = ?restored.position,
            has_settings = restored.settings.is_some(),
            "Restored playback state"
        );

        restored
    }

    fn read_index(&self) -> Option<usize> {
        match self.get(INDEX_KEY) {
            Ok(Some(raw)) => match raw.trim().parse::<usize>() {
                Ok(index) => Some(index),
                Err(_) => {
                    warn!(value = %raw, "Stored queue index is not a number");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Stored queue index unreadable");
                None
            }
        }
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.get(name)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(self.storage.get(&self.key(name))?)
    }

    fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let key = self.key(name);
        Ok(self.storage.set(&key, value)?)
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        let key = self.key(name);
        Ok(self.storage.remove(&key)?)
    }
}
