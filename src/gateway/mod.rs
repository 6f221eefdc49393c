// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Request Gateway Module
//!
//! Every backend call made by the admin console goes through
//! [`RequestGateway::dispatch`]. The gateway owns header construction, token
//! freshness, success/failure normalization and the 401 teardown.
//!
//! ## Collaborators
//!
//! - [`Navigator`] - performs the hard redirect after teardown
//! - [`TokenRefresher`] - called when the token enters the refresh window
//!   ([`NoopRefresher`] by default)

pub mod client;
pub mod navigator;
pub mod refresh;
pub mod request;

pub use client::{RequestGateway, API_KEY_HEADER};
pub use navigator::{LogNavigator, Navigator};
pub use refresh::{NoopRefresher, RefreshDecision, TokenRefresher};
pub use request::{ApiRequest, RequestOptions};
