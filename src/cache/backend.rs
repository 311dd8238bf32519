//! Storage Backend Module
//!
//! Raw string key/value storage underneath the expiring store. The store only
//! depends on the `StorageBackend` trait, so an in-memory map serves tests and
//! a JSON file keeps drafts across restarts.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::StorageError;

// == Storage Backend Trait ==
/// Raw key/value capability, shaped after browser storage.
pub trait StorageBackend: Send + Sync + std::fmt::Debug {
    fn get_item(&self, key: &str) -> Option<String>;

    /// Writes `raw` under `key`, replacing any previous item.
    fn set_item(&mut self, key: &str, raw: String) -> Result<(), StorageError>;

    /// Rewrites `key` for an access-time update only. Backends may defer
    /// persisting it until the next real write.
    fn touch_item(&mut self, key: &str, raw: String) -> Result<(), StorageError> {
        self.set_item(key, raw)
    }

    /// Returns true if an item was removed.
    fn remove_item(&mut self, key: &str) -> bool;

    fn keys(&self) -> Vec<String>;

    fn len(&self) -> usize {
        self.keys().len()
    }
}

// == Memory Storage ==
/// In-memory backend with an optional byte quota.
///
/// Usage is counted as key bytes plus item bytes, like browser storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    used_bytes: usize,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    fn item_size(key: &str, raw: &str) -> usize {
        key.len() + raw.len()
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, raw: String) -> Result<(), StorageError> {
        let replaced = self
            .items
            .get(key)
            .map(|old| Self::item_size(key, old))
            .unwrap_or(0);
        let needed = Self::item_size(key, &raw);

        if let Some(quota) = self.quota_bytes {
            let available = quota.saturating_sub(self.used_bytes - replaced);
            if needed > available {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available,
                });
            }
        }

        self.used_bytes = self.used_bytes - replaced + needed;
        self.items.insert(key.to_string(), raw);
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> bool {
        match self.items.remove(key) {
            Some(old) => {
                self.used_bytes -= Self::item_size(key, &old);
                true
            }
            None => false,
        }
    }

    fn keys(&self) -> Vec<String> {
        self.items.keys().cloned().collect()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

// == File Storage ==
/// Memory backend mirrored to a JSON file after every mutation.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    inner: MemoryStorage,
}

impl FileStorage {
    /// Opens `path`, loading any items a previous run left behind.
    ///
    /// A missing file starts empty. An unreadable file is logged and
    /// replaced on the next write.
    pub fn open(path: impl AsRef<Path>, quota_bytes: Option<usize>) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut inner = match quota_bytes {
            Some(quota) => MemoryStorage::with_quota(quota),
            None => MemoryStorage::new(),
        };

        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
                Ok(items) => {
                    for (key, raw) in items {
                        if let Err(e) = inner.set_item(&key, raw) {
                            warn!(error = %e, "Dropping persisted item while loading");
                        }
                    }
                    debug!(path = %path.display(), items = inner.len(), "Loaded storage file");
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Ignoring corrupt storage file"),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Could not read storage file"),
        }

        Self { path, inner }
    }

    fn flush(&self) -> Result<(), StorageError> {
        let snapshot: BTreeMap<&String, &String> = self.inner.items.iter().collect();
        let contents = serde_json::to_string(&snapshot)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.inner.get_item(key)
    }

    fn set_item(&mut self, key: &str, raw: String) -> Result<(), StorageError> {
        self.inner.set_item(key, raw)?;
        self.flush()
    }

    fn touch_item(&mut self, key: &str, raw: String) -> Result<(), StorageError> {
        self.inner.set_item(key, raw)
    }

    fn remove_item(&mut self, key: &str) -> bool {
        let removed = self.inner.remove_item(key);
        if removed {
            if let Err(e) = self.flush() {
                warn!(path = %self.path.display(), error = %e, "Could not persist removal");
            }
        }
        removed
    }

    fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
