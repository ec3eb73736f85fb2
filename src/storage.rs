//! Persistent key/value flags, the headless counterpart of browser `localStorage`.
//!
//! Values live in a JSON object on disk. A write takes an exclusive `fs2`
//! lock, reloads the file, applies its change to that latest state and
//! rewrites the file before unlocking. Keys written by another process in the
//! meantime are kept.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use fs2::FileExt;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Storage keys shared by the pages.
pub mod keys {
    /// Welcome modal on the question page was dismissed once.
    pub const WELCOME_SEEN: &str = "prizma_welcome_seen";
    /// Tier of the last report seen ready (`free` or `premium`).
    pub const LAST_REPORT_TYPE: &str = "last_report_type";
    /// Overrides the fallback user id outside Telegram.
    pub const TEST_USER_ID: &str = "test_telegram_id";
    /// User left the price-offer page for a payment attempt.
    pub const WAS_ON_SPECIAL_OFFER: &str = "was_on_special_offer";
    /// Milliseconds since epoch when `WAS_ON_SPECIAL_OFFER` was written.
    pub const SPECIAL_OFFER_TIMESTAMP: &str = "special_offer_timestamp";
}

#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: Option<PathBuf>,
    values: Arc<Mutex<BTreeMap<String, String>>>,
}

impl LocalStorage {
    /// Open (or lazily create) a storage file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    Error::StorageError(format!("Corrupt storage file {}: {}", path.display(), e))
                })?
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), keys = values.len(), "Storage opened");
        Ok(Self {
            path: Some(path),
            values: Arc::new(Mutex::new(values)),
        })
    }

    /// Storage that never touches the disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            values: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| Error::StorageError("storage mutex poisoned".into()))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match self.lock() {
            Ok(values) => values.get(key).cloned(),
            Err(err) => {
                warn!(key, "Storage read failed: {}", err);
                None
            }
        }
    }

    pub fn set(&self, key: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        self.update(|values| {
            values.insert(key.to_string(), value);
            true
        })
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.update(|values| values.remove(key).is_some())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// A flag is set when the stored value is the literal `true`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).as_deref() == Some("true")
    }

    pub fn set_flag(&self, key: &str) -> Result<()> {
        self.set(key, "true")
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    /// Apply `change` to the freshest values. The file is rewritten only when
    /// `change` returns true.
    fn update(&self, change: impl FnOnce(&mut BTreeMap<String, String>) -> bool) -> Result<()> {
        let mut values = self.lock()?;
        let Some(path) = &self.path else {
            change(&mut *values);
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| Error::StorageError(format!("Failed to open {}: {}", path.display(), e)))?;

        file.lock_exclusive()
            .map_err(|e| Error::StorageError(format!("Failed to lock {}: {}", path.display(), e)))?;

        let result = Self::rewrite_locked(&mut file, path, &mut *values, change);
        let _ = file.unlock();
        result
    }

    fn rewrite_locked(
        file: &mut fs::File,
        path: &Path,
        values: &mut BTreeMap<String, String>,
        change: impl FnOnce(&mut BTreeMap<String, String>) -> bool,
    ) -> Result<()> {
        let io_error =
            |e: std::io::Error| Error::StorageError(format!("Failed to write {}: {}", path.display(), e));

        let mut content = String::new();
        file.read_to_string(&mut content).map_err(io_error)?;
        if !content.trim().is_empty() {
            *values = serde_json::from_str(&content).map_err(|e| {
                Error::StorageError(format!("Corrupt storage file {}: {}", path.display(), e))
            })?;
        }

        if !change(values) {
            return Ok(());
        }

        let json = serde_json::to_vec_pretty(&*values)?;
        file.set_len(0).map_err(io_error)?;
        file.seek(SeekFrom::Start(0)).map_err(io_error)?;
        file.write_all(&json).map_err(io_error)?;
        file.flush().map_err(io_error)
    }
}
