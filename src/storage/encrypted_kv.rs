// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Encrypted key-value store.
//!
//! Every value passes through [`StorageCipher`] before it reaches the backend
//! and after it comes back. Values are JSON text: objects and lists are
//! serialized, plain strings are stored verbatim.
//!
//! ## Write Modes
//!
//! - [`WriteMode::Single`] - replace whatever is stored under the name
//! - [`WriteMode::Append`] - push onto the JSON list stored under the name
//! - [`WriteMode::RemoveById`] - drop list records whose `id` matches
//!
//! List-mode writes refuse to touch an entry that does not decrypt or does
//! not hold a JSON array. Overwriting it would silently lose data.
//!
//! Mutations are serialized across clones of a store, so concurrent list
//! writes never drop each other's records.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::backend::KeyValueBackend;
use super::cipher::StorageCipher;
use super::error::{StorageError, StorageResult};

/// How a write combines with the value already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the stored value.
    Single,
    /// Append to the stored list (created empty if absent).
    Append,
    /// Remove list records sharing the written record's `id`.
    RemoveById,
}

/// Key-value store that encrypts values at rest.
#[derive(Clone)]
pub struct EncryptedStore {
    backend: Arc<dyn KeyValueBackend>,
    cipher: StorageCipher,
    // Held across read-modify-write cycles.
    write_lock: Arc<Mutex<()>>,
}

impl EncryptedStore {
    /// Create a store over `backend` keyed by `secret`.
    pub fn new(backend: Arc<dyn KeyValueBackend>, secret: &str) -> Self {
        Self {
            backend,
            cipher: StorageCipher::new(secret),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Write `value` under `name` using `mode`.
    pub fn write<T: Serialize + ?Sized>(
        &self,
        name: &str,
        value: &T,
        mode: WriteMode,
    ) -> StorageResult<()> {
        let _guard = self.lock_writes();
        match mode {
            WriteMode::Single => {
                let plaintext = to_plaintext(value)?;
                self.store_plaintext(name, &plaintext)
            }
            WriteMode::Append => {
                let mut records = self.read_sequence(name)?;
                records.push(serde_json::to_value(value)?);
                self.store_plaintext(name, &serde_json::to_string(&records)?)
            }
            WriteMode::RemoveById => {
                let record = serde_json::to_value(value)?;
                let target = record.get("id").ok_or(StorageError::MissingId)?;

                if self.backend.get(name)?.is_none() {
                    return self.backend.remove(name);
                }

                let mut records = self.read_sequence(name)?;
                records.retain(|existing| existing.get("id") != Some(target));
                self.store_plaintext(name, &serde_json::to_string(&records)?)
            }
        }
    }

    /// Read and decrypt the value under `name`.
    ///
    /// Returns `Ok(None)` when nothing is stored. A value that fails to
    /// decrypt is an error; callers that only care about presence should
    /// treat it as absent.
    pub fn read(&self, name: &str) -> StorageResult<Option<String>> {
        let Some(ciphertext) = self.backend.get(name)? else {
            return Ok(None);
        };

        self.cipher
            .decrypt(&ciphertext)
            .map(Some)
            .map_err(|source| StorageError::Decrypt {
                name: name.to_string(),
                source,
            })
    }

    /// Read the value under `name` and parse it as JSON.
    pub fn read_json<T: DeserializeOwned>(&self, name: &str) -> StorageResult<Option<T>> {
        match self.read(name)? {
            Some(plaintext) => Ok(Some(serde_json::from_str(&plaintext)?)),
            None => Ok(None),
        }
    }

    /// Read the list stored under `name`; an absent entry is an empty list.
    pub fn read_sequence(&self, name: &str) -> StorageResult<Vec<Value>> {
        let Some(plaintext) = self.read(name)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Value>(&plaintext) {
            Ok(Value::Array(records)) => Ok(records),
            _ => Err(StorageError::NotASequence {
                name: name.to_string(),
            }),
        }
    }

    /// Remove `name`. Erasing an absent entry is a no-op.
    pub fn erase(&self, name: &str) -> StorageResult<()> {
        let _guard = self.lock_writes();
        self.backend.remove(name)
    }

    /// Remove every entry in the backend, not only the ones this layer wrote.
    pub fn clear_all(&self) -> StorageResult<()> {
        let _guard = self.lock_writes();
        self.backend.clear()
    }

    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn store_plaintext(&self, name: &str, plaintext: &str) -> StorageResult<()> {
        let ciphertext = self
            .cipher
            .encrypt(plaintext)
            .map_err(|source| StorageError::Encrypt {
                name: name.to_string(),
                source,
            })?;
        self.backend.set(name, ciphertext)
    }
}

impl std::fmt::Debug for EncryptedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedStore").finish_non_exhaustive()
    }
}

/// Objects are serialized; strings pass through without quotes.
fn to_plaintext<T: Serialize + ?Sized>(value: &T) -> StorageResult<String> {
    match serde_json::to_value(value)? {
        Value::String(s) => Ok(s),
        other => Ok(serde_json::to_string(&other)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::backend::MemoryBackend;
    use serde_json::json;

    fn store() -> (EncryptedStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        (EncryptedStore::new(backend.clone(), "test-secret"), backend)
    }

    #[test]
    fn single_write_stores_ciphertext_not_plaintext() {
        let (store, backend) = store();
        store.write("USER_TOKEN", "abc.def.ghi", WriteMode::Single).unwrap();

        let raw = backend.get("USER_TOKEN").unwrap().unwrap();
        assert!(!raw.contains("abc.def.ghi"));
        assert_eq!(store.read("USER_TOKEN").unwrap().as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn single_write_overwrites() {
        let (store, _) = store();
        store.write("k", "A", WriteMode::Single).unwrap();
        store.write("k", "B", WriteMode::Single).unwrap();
        assert_eq!(store.read("k").unwrap().as_deref(), Some("B"));
    }

    #[test]
    fn single_write_serializes_objects() {
        let (store, _) = store();
        store
            .write("USER_DETAILS", &json!({"id": "u1", "name": "Ada"}), WriteMode::Single)
            .unwrap();

        let value: Value = store.read_json("USER_DETAILS").unwrap().unwrap();
        assert_eq!(value["name"], "Ada");
    }

    #[test]
    fn append_accumulates_in_order() {
        let (store, _) = store();
        store.write("recent", &json!({"id": 1}), WriteMode::Append).unwrap();
        store.write("recent", &json!({"id": 2}), WriteMode::Append).unwrap();

        let records = store.read_sequence("recent").unwrap();
        assert_eq!(records, vec![json!({"id": 1}), json!({"id": 2})]);
    }

    #[test]
    fn append_keeps_duplicates() {
        let (store, _) = store();
        store.write("recent", "x", WriteMode::Append).unwrap();
        store.write("recent", "x", WriteMode::Append).unwrap();
        assert_eq!(store.read_sequence("recent").unwrap().len(), 2);
    }

    #[test]
    fn append_refuses_undecryptable_entry() {
        let (store, backend) = store();
        backend.set("recent", "garbage".to_string()).unwrap();

        let err = store.write("recent", "x", WriteMode::Append).unwrap_err();
        assert!(matches!(err, StorageError::Decrypt { .. }));
        assert_eq!(backend.get("recent").unwrap().as_deref(), Some("garbage"));
    }

    #[test]
    fn append_refuses_non_list_entry() {
        let (store, _) = store();
        store.write("recent", &json!({"id": 1}), WriteMode::Single).unwrap();

        let err = store.write("recent", "x", WriteMode::Append).unwrap_err();
        assert!(matches!(err, StorageError::NotASequence { .. }));
    }

    #[test]
    fn remove_by_id_filters_matching_records() {
        let (store, _) = store();
        for id in ["a", "b", "a", "c"] {
            store.write("cart", &json!({"id": id}), WriteMode::Append).unwrap();
        }

        store.write("cart", &json!({"id": "a"}), WriteMode::RemoveById).unwrap();

        let ids: Vec<_> = store
            .read_sequence("cart")
            .unwrap()
            .into_iter()
            .map(|r| r["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!("b"), json!("c")]);
    }

    #[test]
    fn remove_by_id_on_absent_entry_is_noop() {
        let (store, backend) = store();
        store.write("cart", &json!({"id": "a"}), WriteMode::RemoveById).unwrap();
        assert!(backend.is_empty());
    }

    #[test]
    fn remove_by_id_requires_id() {
        let (store, _) = store();
        let err = store
            .write("cart", &json!({"sku": "a"}), WriteMode::RemoveById)
            .unwrap_err();
        assert!(matches!(err, StorageError::MissingId));
    }

    #[test]
    fn remove_by_id_refuses_undecryptable_entry() {
        let (store, backend) = store();
        backend.set("cart", "garbage".to_string()).unwrap();

        let err = store
            .write("cart", &json!({"id": "a"}), WriteMode::RemoveById)
            .unwrap_err();
        assert!(err.is_corruption());
    }

    #[test]
    fn read_absent_is_none() {
        let (store, _) = store();
        assert!(store.read("missing").unwrap().is_none());
        assert!(store.read_sequence("missing").unwrap().is_empty());
    }

    #[test]
    fn erase_is_idempotent() {
        let (store, _) = store();
        store.erase("missing").unwrap();

        store.write("k", "v", WriteMode::Single).unwrap();
        store.erase("k").unwrap();
        assert!(store.read("k").unwrap().is_none());
        store.erase("k").unwrap();
    }

    #[test]
    fn foreign_secret_reads_as_decrypt_error() {
        let backend = Arc::new(MemoryBackend::new());
        let writer = EncryptedStore::new(backend.clone(), "one");
        let reader = EncryptedStore::new(backend, "two");

        writer.write("k", "secret-value", WriteMode::Single).unwrap();
        let err = reader.read("k").unwrap_err();
        assert!(matches!(err, StorageError::Decrypt { .. }));
    }

    #[test]
    fn clear_all_wipes_backend() {
        let (store, backend) = store();
        store.write("a", "1", WriteMode::Single).unwrap();
        store.write("b", "2", WriteMode::Single).unwrap();
        backend.set("foreign", "x".to_string()).unwrap();

        store.clear_all().unwrap();
        assert!(backend.is_empty());
    }

    #[test]
    fn concurrent_appends_from_clones_keep_every_record() {
        for _ in 0..50 {
            let (store, _backend) = store();
            let writers: Vec<_> = (0..8)
                .map(|i| {
                    let store = store.clone();
                    std::thread::spawn(move || {
                        store
                            .write("orders", &json!({ "id": i }), WriteMode::Append)
                            .unwrap();
                    })
                })
                .collect();
            for writer in writers {
                writer.join().unwrap();
            }

            let mut ids: Vec<i64> = store
                .read_sequence("orders")
                .unwrap()
                .iter()
                .map(|record| record["id"].as_i64().unwrap())
                .collect();
            ids.sort_unstable();
            assert_eq!(ids, (0..8).collect::<Vec<i64>>());
        }
    }
}
