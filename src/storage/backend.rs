// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persistent key-value backends.
//!
//! The backend stores opaque strings (already encrypted by the layer above)
//! and knows nothing about their content. Two implementations are provided:
//!
//! - [`MemoryBackend`] - process-local map, used by tests and ephemeral runs
//! - [`FileBackend`] - a single JSON object on disk, survives restarts

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::error::StorageResult;

/// A persistent string-to-string store.
///
/// Implementations must treat removing an absent key as a no-op.
pub trait KeyValueBackend: Send + Sync {
    /// Get the raw value stored under `name`.
    fn get(&self, name: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `name`, replacing any previous value.
    fn set(&self, name: &str, value: String) -> StorageResult<()>;

    /// Remove `name`.
    fn remove(&self, name: &str) -> StorageResult<()>;

    /// Remove every key.
    fn clear(&self) -> StorageResult<()>;
}

/// In-memory backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, name: &str) -> StorageResult<Option<String>> {
        Ok(self.lock().get(name).cloned())
    }

    fn set(&self, name: &str, value: String) -> StorageResult<()> {
        self.lock().insert(name.to_string(), value);
        Ok(())
    }

    fn remove(&self, name: &str) -> StorageResult<()> {
        self.lock().remove(name);
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        self.lock().clear();
        Ok(())
    }
}

/// File backend: one JSON object `{ name: value }` per file.
///
/// Every mutation rewrites the whole file through a temp file + rename so a
/// crash never leaves a half-written store behind.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    guard: Mutex<()>,
}

impl FileBackend {
    /// Create a backend persisting to `path`. The file is created lazily.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            guard: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StorageResult<BTreeMap<String, String>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        let entries = serde_json::from_reader(BufReader::new(file))?;
        Ok(entries)
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, entries)?;
            writer.flush()?;
        }

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn modify<F>(&self, f: F) -> StorageResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        if f(&mut entries) {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

impl KeyValueBackend for FileBackend {
    fn get(&self, name: &str) -> StorageResult<Option<String>> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.remove(name))
    }

    fn set(&self, name: &str, value: String) -> StorageResult<()> {
        self.modify(|entries| {
            entries.insert(name.to_string(), value);
            true
        })
    }

    fn remove(&self, name: &str) -> StorageResult<()> {
        self.modify(|entries| entries.remove(name).is_some())
    }

    fn clear(&self) -> StorageResult<()> {
        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_backend_set_get_remove() {
        let backend = MemoryBackend::new();
        assert!(backend.get("a").unwrap().is_none());

        backend.set("a", "1".to_string()).unwrap();
        assert_eq!(backend.get("a").unwrap().as_deref(), Some("1"));

        backend.remove("a").unwrap();
        backend.remove("a").unwrap();
        assert!(backend.is_empty());
    }

    #[test]
    fn file_backend_missing_file_reads_as_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let backend = FileBackend::new(temp_dir.path().join("store.json"));
        assert!(backend.get("anything").unwrap().is_none());
        backend.remove("anything").unwrap();
        backend.clear().unwrap();
    }

    #[test]
    fn file_backend_persists_across_instances() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("nested").join("store.json");

        let first = FileBackend::new(&path);
        first.set("USER_TOKEN", "abc".to_string()).unwrap();
        first.set("USER_DETAILS", "def".to_string()).unwrap();

        let second = FileBackend::new(&path);
        assert_eq!(second.get("USER_TOKEN").unwrap().as_deref(), Some("abc"));
        assert_eq!(second.get("USER_DETAILS").unwrap().as_deref(), Some("def"));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn file_backend_clear_removes_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("store.json");
        let backend = FileBackend::new(&path);
        backend.set("k", "v".to_string()).unwrap();
        assert!(path.exists());

        backend.clear().unwrap();
        assert!(!path.exists());
        assert!(backend.get("k").unwrap().is_none());
    }

    #[test]
    fn file_backend_rejects_corrupted_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("store.json");
        fs::write(&path, b"not json").unwrap();

        let backend = FileBackend::new(&path);
        assert!(backend.get("k").is_err());
    }
}
