//! Key-value storage adapter.
//!
//! Structured values are kept as JSON text under string keys, the same shape
//! the site has always used for `currentUser`, `users`, `contacts` and
//! `newsletter`. Backends only deal in raw strings; [`Storage`] handles
//! (de)serialization and the write retry policy.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced by storage writes.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize value for '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage quota exceeded writing '{key}' ({needed} bytes needed, limit {limit})")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value for '{key}' is unreadable: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage file {} is not a JSON object: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Only transient I/O failures are worth another attempt.
    fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Io(_))
    }
}

/// A string-keyed, string-valued persistent store.
pub trait Backend {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    fn delete(&mut self, key: &str) -> Result<(), StoreError>;
    fn wipe(&mut self) -> Result<(), StoreError>;
}

/// In-process backend with an optional byte quota (key + value lengths).
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota: Some(bytes),
        }
    }

    fn used_bytes(&self) -> usize {
        self.entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl Backend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        if let Some(limit) = self.quota {
            let existing = self.entries.get(key).map_or(0, |v| key.len() + v.len());
            let needed = self.used_bytes() - existing + key.len() + value.len();
            if needed > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn wipe(&mut self) -> Result<(), StoreError> {
        self.entries.clear();
        Ok(())
    }
}

/// Backend persisted as a single JSON object file.
///
/// The whole map is loaded on open and rewritten (temp file + rename) on every
/// mutation. A failed rewrite leaves the in-memory map as it was before the call.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileBackend {
    /// Open the store at `path`. A missing or empty file is an empty store.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let entries = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
                    path: path.to_path_buf(),
                    source,
                })?
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&self.entries).map_err(|source| {
            StoreError::Serialize {
                key: "*".to_string(),
                source,
            }
        })?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply a change to the map, flush, and roll the map back if the flush fails.
    fn mutate<F>(&mut self, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let previous = self.entries.clone();
        change(&mut self.entries);
        if let Err(e) = self.flush() {
            self.entries = previous;
            return Err(e);
        }
        Ok(())
    }
}

impl Backend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value);
        })
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        if !self.entries.contains_key(key) {
            return Ok(());
        }
        self.mutate(|entries| {
            entries.remove(key);
        })
    }

    fn wipe(&mut self) -> Result<(), StoreError> {
        self.mutate(BTreeMap::clear)
    }
}

/// Typed access to a [`Backend`].
///
/// [`Storage::get`] never fails: a missing key, a backend error or an
/// undecodable value all read as `None` (errors are reported as warnings).
/// Read-modify-write paths use [`Storage::try_get`] so an unreadable value is
/// never replaced. Writes return `Result` and are retried `write_retries`
/// extra times on I/O errors.
pub struct Storage {
    backend: Box<dyn Backend>,
    write_retries: u32,
}

impl Storage {
    pub fn new(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            write_retries: 1,
        }
    }

    pub fn memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()))
    }

    pub fn open_file(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::new(Box::new(FileBackend::open(path)?)))
    }

    pub fn with_write_retries(mut self, retries: u32) -> Self {
        self.write_retries = retries;
        self
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_get(key) {
            Ok(value) => value,
            Err(e) => {
                eprintln!("Warning: failed to read '{}' from storage: {}", key, e);
                None
            }
        }
    }

    /// Like [`Storage::get`], but a present value that cannot be read is an error.
    pub fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.backend.read(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Decode {
                key: key.to_string(),
                source,
            })
    }

    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.with_retries(|backend| backend.write(key, raw.clone()))
    }

    pub fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.with_retries(|backend| backend.delete(key))
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.with_retries(|backend| backend.wipe())
    }

    fn with_retries<F>(&mut self, mut op: F) -> Result<(), StoreError>
    where
        F: FnMut(&mut Box<dyn Backend>) -> Result<(), StoreError>,
    {
        let mut attempt = 0;
        loop {
            match op(&mut self.backend) {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() && attempt < self.write_retries => attempt += 1,
                Err(e) => return Err(e),
            }
        }
    }
}
