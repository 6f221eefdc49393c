// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Names of the persisted session entries.
//!
//! These strings are part of the on-disk/browser-store contract. Renaming one
//! orphans every session persisted under the old name.

/// Bearer token (single mode).
pub const USER_TOKEN: &str = "USER_TOKEN";

/// Serialized identity record (single mode).
pub const USER_DETAILS: &str = "USER_DETAILS";

/// RFC 3339 timestamp of the last dispatched request (single mode).
pub const SESSION_TIME: &str = "SESSION_TIME";

/// Every entry owned by the session layer.
pub const SESSION_KEYS: [&str; 3] = [USER_TOKEN, USER_DETAILS, SESSION_TIME];
