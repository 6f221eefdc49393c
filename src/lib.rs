// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin Gateway - session & API gateway core for the marketplace admin console
//!
//! Every screen of the admin console (products, orders, users, categories,
//! hero images, size charts, settings) reaches the backend through this crate.
//!
//! ## Modules
//!
//! - `storage` - Obfuscated key-value store for the persisted session
//! - `auth` - Identity record and unsigned bearer-token claim reading
//! - `session` - Signed-in state, loaded at startup, cleared on teardown
//! - `gateway` - Request dispatch, refresh window, 401 teardown
//! - `ui` - In-flight indicator and toast message state
//! - `context` - Wires the above together for one app instance

pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod session;
pub mod storage;
pub mod ui;

pub use context::AdminContext;
pub use error::GatewayError;
