// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The request gateway: the single path from the admin console to the backend.
//!
//! ## Dispatch
//!
//! 1. Headers: `x-api-key`, caller extras, then `Authorization: Bearer <token>`
//!    when the call requires auth and a session exists
//! 2. The token's `exp` is evaluated against the refresh window; inside the
//!    window the [`TokenRefresher`] is asked for a replacement
//! 3. `SESSION_TIME` is stamped. The request counts as in flight from the
//!    start of dispatch until it settles, whatever the outcome
//! 4. 200/201 return the decoded body; anything else is an error
//! 5. 401 tears the session down (memory + persisted state) and redirects to
//!    the entry route before the error reaches the caller
//!
//! There are no retries and no cancellation at this layer.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::navigator::{LogNavigator, Navigator};
use super::refresh::{self, NoopRefresher, RefreshDecision, TokenRefresher};
use super::request::{ApiRequest, RequestOptions};
use crate::config::{GatewayConfig, ENTRY_ROUTE};
use crate::error::GatewayError;
use crate::session::SessionManager;
use crate::ui::UiBroadcaster;

/// Header carrying the static API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Gateway for every backend call.
pub struct RequestGateway {
    base_url: String,
    api_key: HeaderValue,
    refresh_window: Duration,
    http: Client,
    session: Arc<SessionManager>,
    ui: UiBroadcaster,
    navigator: Arc<dyn Navigator>,
    refresher: Arc<dyn TokenRefresher>,
    last_decision: Mutex<Option<RefreshDecision>>,
}

impl RequestGateway {
    /// Create a gateway with a logging navigator and no-op refresher.
    pub fn new(
        config: &GatewayConfig,
        session: Arc<SessionManager>,
        ui: UiBroadcaster,
    ) -> Result<Self, GatewayError> {
        let mut api_key = HeaderValue::from_str(&config.api_key).map_err(|_| {
            GatewayError::InvalidRequest("API key is not a valid header value".to_string())
        })?;
        api_key.set_sensitive(true);

        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            api_key,
            refresh_window: config.refresh_window,
            http,
            session,
            ui,
            navigator: Arc::new(LogNavigator),
            refresher: Arc::new(NoopRefresher),
            last_decision: Mutex::new(None),
        })
    }

    /// Use `navigator` for the post-teardown redirect.
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Use `refresher` when the token enters the refresh window.
    pub fn with_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = refresher;
        self
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn ui(&self) -> &UiBroadcaster {
        &self.ui
    }

    /// Refresh-window evaluation made by the most recent dispatch.
    pub fn last_refresh_decision(&self) -> Option<RefreshDecision> {
        *self
            .last_decision
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Absolute URL for `path`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Issue `request` and return the decoded response body.
    pub async fn dispatch(&self, request: ApiRequest) -> Result<Value, GatewayError> {
        let _loading = self.ui.begin_request();
        let mut headers = self.base_headers(&request.options)?;

        match self.session.token().filter(|_| request.require_auth) {
            Some(token) => self.authorize(&mut headers, token).await?,
            None => self.record_decision(RefreshDecision::Skipped),
        }

        if let Err(e) = self.session.touch() {
            warn!(error = %e, "Failed to record session activity");
        }

        let url = self.url_for(&request.path);
        debug!(method = %request.method, path = %request.path, "Dispatching request");

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .headers(headers);
        if !request.options.query.is_empty() {
            builder = builder.query(&request.options.query);
        }
        if let Some(body) = request.effective_body() {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(method = %request.method, path = %request.path, error = %e, "Request did not reach the server");
            GatewayError::Network(e.to_string())
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            warn!(path = %request.path, error = %e, "Response body could not be read");
            GatewayError::Network(e.to_string())
        })?;
        let payload = parse_payload(&bytes);

        if status == StatusCode::OK || status == StatusCode::CREATED {
            return Ok(payload);
        }

        if status == StatusCode::UNAUTHORIZED {
            warn!(path = %request.path, "Server rejected the session, tearing down");
            self.teardown();
            return Err(GatewayError::AuthExpired { body: payload });
        }

        debug!(path = %request.path, status = status.as_u16(), "Request failed");
        Err(GatewayError::Http {
            status: status.as_u16(),
            body: payload,
        })
    }

    /// Dispatch and deserialize the success body into `T`.
    pub async fn dispatch_as<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, GatewayError> {
        let payload = self.dispatch(request).await?;
        Ok(serde_json::from_value(payload)?)
    }

    pub async fn get(&self, path: &str) -> Result<Value, GatewayError> {
        self.dispatch(ApiRequest::get(path)).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Value, GatewayError> {
        self.dispatch(ApiRequest::post(path, body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<Value, GatewayError> {
        self.dispatch(ApiRequest::put(path, body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> Result<Value, GatewayError> {
        self.dispatch(ApiRequest::patch(path, body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, GatewayError> {
        self.dispatch(ApiRequest::delete(path)).await
    }

    /// Clear the session and all persisted state, then redirect to the entry route.
    ///
    /// Storage failures are logged; the redirect always happens.
    pub fn teardown(&self) {
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear session entries");
        }
        if let Err(e) = self.session.store().clear_all() {
            warn!(error = %e, "Failed to clear persisted state");
        }
        info!(route = ENTRY_ROUTE, "Session torn down");
        self.navigator.navigate(ENTRY_ROUTE);
    }

    fn base_headers(&self, options: &RequestOptions) -> Result<HeaderMap, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, self.api_key.clone());

        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| GatewayError::InvalidRequest(format!("invalid header name `{name}`")))?;
            let value = HeaderValue::from_str(value).map_err(|_| {
                GatewayError::InvalidRequest(format!("invalid value for header `{name}`"))
            })?;
            headers.insert(name, value);
        }

        Ok(headers)
    }

    /// Attach the bearer token, refreshing it first when it is inside the window.
    async fn authorize(&self, headers: &mut HeaderMap, token: String) -> Result<(), GatewayError> {
        headers.insert(AUTHORIZATION, bearer(&token)?);

        let decision = refresh::evaluate(&token, Utc::now().timestamp(), self.refresh_window);
        self.record_decision(decision);

        if let RefreshDecision::WithinWindow { remaining_secs } = decision {
            info!(remaining_secs, "Bearer token inside refresh window");
            match self.refresher.refresh(headers).await {
                Ok(Some(new_token)) => {
                    if let Err(e) = self.session.replace_token(new_token.as_str()) {
                        warn!(error = %e, "Failed to persist refreshed token");
                    }
                    headers.insert(AUTHORIZATION, bearer(&new_token)?);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "Token refresh failed, continuing with current token");
                }
            }
        }

        Ok(())
    }

    fn record_decision(&self, decision: RefreshDecision) {
        *self
            .last_decision
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(decision);
    }
}

impl std::fmt::Debug for RequestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGateway")
            .field("base_url", &self.base_url)
            .field("refresh_window", &self.refresh_window)
            .finish_non_exhaustive()
    }
}

fn bearer(token: &str) -> Result<HeaderValue, GatewayError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
        GatewayError::InvalidRequest("bearer token is not a valid header value".to_string())
    })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Empty bodies decode to `null`, non-JSON bodies to a string.
fn parse_payload(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
