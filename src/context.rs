// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Application context: the session, UI state and gateway for one app instance.
//!
//! Nothing here is a process global. Hosts build one context at startup and
//! hand clones of its handles to whatever needs them; tests build as many
//! isolated contexts as they like.

use std::sync::Arc;

use crate::auth::Identity;
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::gateway::{LogNavigator, Navigator, NoopRefresher, RequestGateway, TokenRefresher};
use crate::session::SessionManager;
use crate::storage::{EncryptedStore, KeyValueBackend, StorageResult};
use crate::ui::UiBroadcaster;

#[derive(Clone, Debug)]
pub struct AdminContext {
    pub session: Arc<SessionManager>,
    pub ui: UiBroadcaster,
    pub gateway: Arc<RequestGateway>,
}

impl AdminContext {
    /// Build a context over `backend` with the default collaborators.
    pub fn new(config: &GatewayConfig, backend: Arc<dyn KeyValueBackend>) -> Result<Self, GatewayError> {
        Self::with_collaborators(
            config,
            backend,
            Arc::new(LogNavigator),
            Arc::new(NoopRefresher),
        )
    }

    /// Build a context with a custom navigator and token refresher.
    pub fn with_collaborators(
        config: &GatewayConfig,
        backend: Arc<dyn KeyValueBackend>,
        navigator: Arc<dyn Navigator>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Result<Self, GatewayError> {
        let store = Arc::new(EncryptedStore::new(backend, &config.storage_secret));
        let session = Arc::new(SessionManager::load_from_store(store));
        let ui = UiBroadcaster::new();
        let gateway = RequestGateway::new(config, session.clone(), ui.clone())?
            .with_navigator(navigator)
            .with_refresher(refresher);

        Ok(Self {
            session,
            ui,
            gateway: Arc::new(gateway),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Entry point for the login flow once the backend has issued a token.
    pub fn sign_in(&self, identity: Identity, token: impl Into<String>) -> StorageResult<()> {
        self.session.set_auth_details(identity, token)
    }

    /// Sign out: same teardown as a rejected session.
    pub fn logout(&self) {
        self.gateway.teardown();
    }
}
