// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Manager
//!
//! Owns the signed-in identity and bearer token.
//!
//! ## Invariants
//!
//! - `identity` and `token` are set together by [`SessionManager::set_auth_details`]
//!   and cleared together by [`SessionManager::clear`]
//! - A persisted session missing either half loads as signed out
//! - [`SessionManager::is_authenticated`] is `true` iff an identity is present
//!
//! Writers hold the state lock across the persisted writes, so memory and
//! storage change together. The in-memory state is cleared *before* the
//! persisted entries so no reader can observe a token after teardown has
//! started. Debug output never includes the token.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::auth::Identity;
use crate::storage::{keys, EncryptedStore, StorageResult, WriteMode};

/// Snapshot of the session.
#[derive(Clone, Default, PartialEq)]
pub struct Session {
    pub identity: Option<Identity>,
    pub token: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Read both entries from `store`. Anything absent or unreadable yields
    /// an empty session.
    pub fn load(store: &EncryptedStore) -> Self {
        let identity = match store.read_json::<Identity>(keys::USER_DETAILS) {
            Ok(identity) => identity,
            Err(e) => {
                warn!(error_code = e.error_code(), "Stored identity unreadable, treating as signed out");
                None
            }
        };
        let token = match store.read(keys::USER_TOKEN) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error_code = e.error_code(), "Stored token unreadable, treating as signed out");
                None
            }
        };

        match (identity, token) {
            (Some(identity), Some(token)) => Self {
                identity: Some(identity),
                token: Some(token),
            },
            (None, None) => Self::default(),
            _ => {
                warn!("Persisted session is incomplete, treating as signed out");
                Self::default()
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Session state shared by the gateway and the UI.
pub struct SessionManager {
    store: Arc<EncryptedStore>,
    state: RwLock<Session>,
}

impl SessionManager {
    /// Build the manager from whatever is persisted in `store`.
    ///
    /// Call once at startup; the result is the session a reload would see.
    pub fn load_from_store(store: Arc<EncryptedStore>) -> Self {
        let session = Session::load(&store);
        info!(authenticated = session.is_authenticated(), "Session loaded from store");
        Self {
            store,
            state: RwLock::new(session),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<EncryptedStore> {
        &self.store
    }

    /// Persist `identity` and `token`, then publish them in memory.
    ///
    /// If the token cannot be written the identity is rolled back so the
    /// persisted pair stays consistent.
    pub fn set_auth_details(&self, identity: Identity, token: impl Into<String>) -> StorageResult<()> {
        let token = token.into();
        let mut state = self.write_state();

        self.store.write(keys::USER_DETAILS, &identity, WriteMode::Single)?;
        if let Err(e) = self.store.write(keys::USER_TOKEN, token.as_str(), WriteMode::Single) {
            if let Err(rollback) = self.store.erase(keys::USER_DETAILS) {
                warn!(error = %rollback, "Failed to roll back identity after token write failure");
            }
            return Err(e);
        }

        info!(user_id = %identity.id, "Session established");
        *state = Session {
            identity: Some(identity),
            token: Some(token),
        };
        Ok(())
    }

    /// Swap the bearer token of the current session, keeping the identity.
    ///
    /// Returns `Ok(false)` when there is no session to update.
    pub fn replace_token(&self, token: impl Into<String>) -> StorageResult<bool> {
        let token = token.into();
        let mut state = self.write_state();
        if state.identity.is_none() {
            return Ok(false);
        }

        self.store.write(keys::USER_TOKEN, token.as_str(), WriteMode::Single)?;
        state.token = Some(token);
        debug!("Session token replaced");
        Ok(true)
    }

    /// Sign out: reset memory, then erase both persisted entries.
    ///
    /// Both entries are attempted even if the first erase fails; the first
    /// error is returned.
    pub fn clear(&self) -> StorageResult<()> {
        let mut state = self.write_state();
        *state = Session::default();

        let details = self.store.erase(keys::USER_DETAILS);
        let token = self.store.erase(keys::USER_TOKEN);
        info!("Session cleared");
        details.and(token)
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_state().is_authenticated()
    }

    pub fn token(&self) -> Option<String> {
        self.read_state().token.clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.read_state().identity.clone()
    }

    /// Copy of the current session.
    pub fn snapshot(&self) -> Session {
        self.read_state().clone()
    }

    // ========== Activity Bookkeeping ==========

    /// Record activity at `now` under `SESSION_TIME`.
    pub fn touch_at(&self, now: DateTime<Utc>) -> StorageResult<()> {
        self.store
            .write(keys::SESSION_TIME, now.to_rfc3339().as_str(), WriteMode::Single)
    }

    /// Record activity now.
    pub fn touch(&self) -> StorageResult<()> {
        self.touch_at(Utc::now())
    }

    /// Timestamp of the last recorded activity.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        let raw = self.store.read(keys::SESSION_TIME).ok().flatten()?;
        DateTime::parse_from_rfc3339(&raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Time elapsed between the last activity and `now`.
    pub fn idle_for(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.last_activity().map(|last| now - last)
    }

    fn read_state(&self) -> RwLockReadGuard<'_, Session> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, Session> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("session", &*self.read_state())
            .finish_non_exhaustive()
    }
}
