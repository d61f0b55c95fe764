//! Inventory persistence.
//!
//! Every save replaces the whole inventory; there is no merging and no
//! partial write. Two media are provided: a JSON file on disk and a
//! key-value medium holding one JSON document under a fixed key, the way
//! browser storage does.

use crate::{Error, Prescription, Result};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Key under which key-value media hold the inventory document
pub const STORAGE_KEY: &str = "prescriptions";

/// Backing medium for the prescription list
pub trait InventoryStore {
    /// Restore the saved inventory. No prior data is an empty list.
    fn load(&self) -> Result<Vec<Prescription>>;

    /// Replace the saved inventory with `prescriptions`.
    fn save(&mut self, prescriptions: &[Prescription]) -> Result<()>;
}

// ============================================================================
// File medium
// ============================================================================

/// JSON file store with atomic replace and a writer lock
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn open_lock(&self) -> Result<File> {
        Ok(OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?)
    }

    fn parent_dir(&self) -> Result<&Path> {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => Ok(p),
            Some(_) => Ok(Path::new(".")),
            None => Err(Error::Store(format!(
                "inventory path {:?} has no parent directory",
                self.path
            ))),
        }
    }
}

impl InventoryStore for JsonFileStore {
    fn load(&self) -> Result<Vec<Prescription>> {
        if !self.path.exists() {
            tracing::info!("No inventory at {:?}, starting empty", self.path);
            return Ok(Vec::new());
        }

        let lock = self.open_lock()?;
        lock.lock_shared()?;
        let contents = std::fs::read_to_string(&self.path);
        lock.unlock()?;

        let prescriptions: Vec<Prescription> = serde_json::from_str(&contents?)?;
        tracing::debug!(
            "Loaded {} prescriptions from {:?}",
            prescriptions.len(),
            self.path
        );
        Ok(prescriptions)
    }

    /// Atomically writes the inventory by:
    /// 1. Writing to a temp file in the same directory
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    ///
    /// Writers hold an exclusive lock on a sidecar file for the whole
    /// sequence, so concurrent processes never interleave full replaces.
    fn save(&mut self, prescriptions: &[Prescription]) -> Result<()> {
        let parent = self.parent_dir()?.to_path_buf();
        std::fs::create_dir_all(&parent)?;

        let lock = self.open_lock()?;
        lock.lock_exclusive()?;

        let result = (|| -> Result<()> {
            let temp = NamedTempFile::new_in(&parent)?;
            {
                let mut writer = BufWriter::new(temp.as_file());
                serde_json::to_writer_pretty(&mut writer, prescriptions)?;
                writer.flush()?;
            }
            temp.as_file().sync_all()?;
            temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
            Ok(())
        })();

        lock.unlock()?;
        result?;

        tracing::debug!(
            "Saved {} prescriptions to {:?}",
            prescriptions.len(),
            self.path
        );
        Ok(())
    }
}

// ============================================================================
// Key-value medium
// ============================================================================

/// String key-value storage, shaped like browser local storage
pub trait KeyValueBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: String) -> Result<()>;
}

/// Process-local key-value medium
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Inventory kept as one JSON string under [`STORAGE_KEY`]
#[derive(Clone, Debug, Default)]
pub struct KeyValueStore<B> {
    backend: B,
}

impl<B: KeyValueBackend> KeyValueStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: KeyValueBackend> InventoryStore for KeyValueStore<B> {
    fn load(&self) -> Result<Vec<Prescription>> {
        match self.backend.get_item(STORAGE_KEY)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => {
                tracing::info!("No stored inventory under {:?}, starting empty", STORAGE_KEY);
                Ok(Vec::new())
            }
        }
    }

    fn save(&mut self, prescriptions: &[Prescription]) -> Result<()> {
        let json = serde_json::to_string(prescriptions)?;
        self.backend.set_item(STORAGE_KEY, json)
    }
}
