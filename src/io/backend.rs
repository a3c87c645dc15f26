//! Key-value persistence backends.
//!
//! The task store only ever needs two operations: read a named slot and
//! overwrite it in full. [`MemoryBackend`] keeps slots in a map (tests, and
//! embedding without a disk); [`FileBackend`] keeps each slot as
//! `<dir>/<key>.json` and survives process restarts.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::io::lock::{DEFAULT_LOCK_TIMEOUT, LockError, StoreLock};

/// Error type for backend reads and writes
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Lock(#[from] LockError),
}

/// A synchronous, process-local slot store.
pub trait KeyValueBackend {
    /// The bytes stored under `key`, or `None` if nothing was ever stored.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError>;

    /// Replace whatever is stored under `key`.
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), BackendError>;
}

impl<B: KeyValueBackend + ?Sized> KeyValueBackend for &mut B {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), BackendError> {
        (**self).set(key, value)
    }
}

/// Keys double as file names, so keep them to a safe alphabet.
fn validate_key(key: &str) -> Result<(), BackendError> {
    let ok = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(BackendError::InvalidKey(key.to_string()))
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    slots: HashMap<String, Vec<u8>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        validate_key(key)?;
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), BackendError> {
        validate_key(key)?;
        self.slots.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// On disk
// ---------------------------------------------------------------------------

/// One JSON file per key inside a data directory.
///
/// Writes go through a temp file in the same directory and are renamed into
/// place under a [`StoreLock`], so a reader never sees a half-written slot.
/// A backend from [`FileBackend::locked`] holds that lock for its whole
/// lifetime, which makes a load/modify/save cycle exclusive across processes.
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
    lock: Option<StoreLock>,
}

impl FileBackend {
    /// Use `dir` as the data directory. It is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileBackend {
            dir: dir.into(),
            lock: None,
        }
    }

    /// Create `dir` if needed and lock it until the backend is dropped.
    pub fn locked(dir: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| BackendError::Write {
            path: dir.clone(),
            source,
        })?;
        let lock = StoreLock::acquire(&dir, DEFAULT_LOCK_TIMEOUT)?;
        Ok(FileBackend {
            dir,
            lock: Some(lock),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_some()
    }

    /// Path of the file backing `key`
    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        validate_key(key)?;
        let path = self.slot_path(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(BackendError::Read { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), BackendError> {
        validate_key(key)?;
        fs::create_dir_all(&self.dir).map_err(|source| BackendError::Write {
            path: self.dir.clone(),
            source,
        })?;
        // flock is per open file, so taking it again here would deadlock
        let _lock = if self.is_locked() {
            None
        } else {
            Some(StoreLock::acquire(&self.dir, DEFAULT_LOCK_TIMEOUT)?)
        };
        let path = self.slot_path(key);
        atomic_write(&path, value).map_err(|source| BackendError::Write {
            path: path.clone(),
            source,
        })?;
        log::debug!("wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

/// Write via a sibling temp file and rename over `path`.
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
