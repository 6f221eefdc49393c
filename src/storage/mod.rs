// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Storage Module
//!
//! Persistent storage for the admin session: the bearer token, the identity
//! record and the last-activity timestamp.
//!
//! ## Security Model
//!
//! - Values are encrypted with a static secret compiled into the client
//! - The secret is recoverable from the client build, so this is obfuscation
//!   and storage hygiene, **not** a confidentiality boundary
//! - Tampered or foreign-keyed values fail authentication and read as errors,
//!   which the session layer treats as "no session"
//!
//! ## Layout
//!
//! ```text
//! backend (string -> string)
//!   USER_TOKEN    base64(nonce || seal(token))
//!   USER_DETAILS  base64(nonce || seal(json identity))
//!   SESSION_TIME  base64(nonce || seal(rfc3339 timestamp))
//! ```

pub mod backend;
pub mod cipher;
pub mod encrypted_kv;
pub mod error;
pub mod keys;

pub use backend::{FileBackend, KeyValueBackend, MemoryBackend};
pub use cipher::{CipherError, StorageCipher};
pub use encrypted_kv::{EncryptedStore, WriteMode};
pub use error::{StorageError, StorageResult};
