// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Process-wide UI state shared between the gateway and the screens.

pub mod broadcaster;

pub use broadcaster::{
    LoadingGuard, MessageKind, MessagePhase, UiBroadcaster, UiSnapshot, MESSAGE_DISMISS_DELAY,
    MESSAGE_FADE_DELAY,
};
