// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Client-side view of the admin's credentials.
//!
//! ## Flow
//!
//! 1. The login screen posts credentials and receives `{ identity, token }`
//! 2. The session layer persists both (see [`crate::session`])
//! 3. Every gateway call sends `Authorization: Bearer <token>` and reads the
//!    token's `exp` via [`inspector::decode`] to time a proactive refresh
//!
//! ## Security
//!
//! - Claims are decoded **without** signature verification
//! - They are a UX hint for refresh timing, never an authorization input
//! - The backend verifies every token and answers 401 when it rejects one

pub mod claims;
pub mod error;
pub mod identity;
pub mod inspector;

pub use claims::TokenClaims;
pub use error::DecodeError;
pub use identity::Identity;
