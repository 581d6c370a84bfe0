//! Key/value storage backends for persisted workspace documents.
//!
//! Backends only move opaque strings; versioning and schema checks live in
//! [`crate::store`].

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid storage key: {key:?}")]
    InvalidKey { key: String },
}

/// Minimal durable string map.
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Whole-value replace; last write wins.
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;

    /// Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> StorageResult<()>;
}

/// In-process storage for tests and popout windows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        let _ = self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        let _ = self.entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory.
///
/// Writes use a temp-file-then-rename pattern so a crash mid-write never
/// leaves a truncated document behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a storage directory.
    pub fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `key`.
    ///
    /// Bytes outside `[A-Za-z0-9._-]`, a leading dot and `%` itself are written
    /// as `%XX`, so any non-empty key maps to exactly one file that can never
    /// escape the storage directory.
    pub fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.root.join(format!("{}.json", escape_key(key))))
    }
}

fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for (index, byte) in key.bytes().enumerate() {
        let plain = byte.is_ascii_alphanumeric()
            || matches!(byte, b'_' | b'-')
            || (byte == b'.' && index > 0);
        if plain {
            escaped.push(char::from(byte));
        } else {
            escaped.push_str(&format!("%{byte:02X}"));
        }
    }
    escaped
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        // Atomic write: temp file then rename
        let temp = path.with_extension("json.tmp");
        std::fs::write(&temp, value)?;
        std::fs::rename(&temp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Backend selected from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfiguredStorage {
    Memory(MemoryStorage),
    File(FileStorage),
}

impl ConfiguredStorage {
    /// File storage under `dir`, or memory storage when no directory is set.
    pub fn from_dir(dir: Option<&Path>) -> StorageResult<Self> {
        match dir {
            Some(dir) => Ok(Self::File(FileStorage::new(dir)?)),
            None => Ok(Self::Memory(MemoryStorage::new())),
        }
    }
}

impl KeyValueStorage for ConfiguredStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match self {
            Self::Memory(storage) => storage.get(key),
            Self::File(storage) => storage.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        match self {
            Self::Memory(storage) => storage.set(key, value),
            Self::File(storage) => storage.set(key, value),
        }
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        match self {
            Self::Memory(storage) => storage.remove(key),
            Self::File(storage) => storage.remove(key),
        }
    }
}
