// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Proactive token refresh: window evaluation and the refresher capability.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use crate::auth::inspector;
use crate::error::GatewayError;

/// Outcome of evaluating the current token against the refresh window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshDecision {
    /// No token was attached (anonymous call or signed out)
    Skipped,
    /// Claims could not be decoded; refresh is not attempted
    ClaimsUnknown,
    /// Token carries no `exp`
    NoExpiry,
    /// Outside the window
    Fresh { remaining_secs: i64 },
    /// Inside the window; a refresh is due
    WithinWindow { remaining_secs: i64 },
    /// Already expired; the server will answer 401
    Expired { overdue_secs: i64 },
}

impl RefreshDecision {
    pub fn refresh_due(&self) -> bool {
        matches!(self, RefreshDecision::WithinWindow { .. })
    }
}

/// Evaluate `token` at Unix time `now` against `window`.
///
/// Due when `0 < exp - now < window`.
pub fn evaluate(token: &str, now: i64, window: Duration) -> RefreshDecision {
    let Some(claims) = inspector::decode_lenient(token) else {
        return RefreshDecision::ClaimsUnknown;
    };
    let Some(remaining) = claims.remaining_secs(now) else {
        return RefreshDecision::NoExpiry;
    };

    let window = i64::try_from(window.as_secs()).unwrap_or(i64::MAX);
    if remaining <= 0 {
        RefreshDecision::Expired {
            overdue_secs: remaining.saturating_neg(),
        }
    } else if remaining < window {
        RefreshDecision::WithinWindow {
            remaining_secs: remaining,
        }
    } else {
        RefreshDecision::Fresh {
            remaining_secs: remaining,
        }
    }
}

/// Obtains a replacement bearer token.
///
/// `headers` are the headers the triggering request is about to send
/// (API key and current bearer token).
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// `Ok(Some(token))` replaces the session token; `Ok(None)` keeps it.
    async fn refresh(&self, headers: &HeaderMap) -> Result<Option<String>, GatewayError>;
}

/// Refresher that never refreshes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRefresher;

#[async_trait]
impl TokenRefresher for NoopRefresher {
    async fn refresh(&self, _headers: &HeaderMap) -> Result<Option<String>, GatewayError> {
        Ok(None)
    }
}
