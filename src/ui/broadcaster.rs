// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Global UI state: the in-flight indicator and the toast message.
//!
//! ## Loading
//!
//! `loading` is derived from a counter of in-flight requests, so overlapping
//! requests keep the indicator up until the last one settles. Requests hold a
//! [`LoadingGuard`] which decrements on drop, including on error paths and
//! when the request future is dropped mid-flight.
//!
//! ## Messages
//!
//! ```text
//! Idle --set_message--> Visible --dismiss timer / clear_message--> FadingOut --fade--> Idle
//!                        ^                                            |
//!                        +----------------- set_message --------------+
//! ```
//!
//! Each `set_message`/`clear_message` bumps a generation counter and aborts
//! the pending timer task. A timer only touches state if its generation is
//! still current, so a late timer can never wipe a newer message. The
//! generation, the message state and the pending timer change together under
//! one lock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Delay before a message hides itself.
pub const MESSAGE_DISMISS_DELAY: Duration = Duration::from_millis(3000);

/// Delay between hiding a message and dropping its text.
pub const MESSAGE_FADE_DELAY: Duration = Duration::from_millis(300);

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Success,
    Error,
    Info,
}

/// Lifecycle phase of the toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePhase {
    Idle,
    Visible,
    FadingOut,
}

/// Observable UI state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiSnapshot {
    /// Requests currently in flight
    pub in_flight: usize,
    pub message: Option<String>,
    pub message_kind: Option<MessageKind>,
    pub visible: bool,
}

impl UiSnapshot {
    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn phase(&self) -> MessagePhase {
        match (&self.message, self.visible) {
            (_, true) => MessagePhase::Visible,
            (Some(_), false) => MessagePhase::FadingOut,
            (None, false) => MessagePhase::Idle,
        }
    }
}

#[derive(Default)]
struct MessageTimer {
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

struct Inner {
    state: watch::Sender<UiSnapshot>,
    timer: Mutex<MessageTimer>,
    dismiss_delay: Duration,
    fade_delay: Duration,
}

/// Shared handle to the UI state. Cloning is cheap; clones share state.
#[derive(Clone)]
pub struct UiBroadcaster {
    inner: Arc<Inner>,
}

impl Default for UiBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl UiBroadcaster {
    /// Create a broadcaster with the standard 3000 ms / 300 ms delays.
    pub fn new() -> Self {
        Self::with_delays(MESSAGE_DISMISS_DELAY, MESSAGE_FADE_DELAY)
    }

    /// Create a broadcaster with custom message delays.
    pub fn with_delays(dismiss_delay: Duration, fade_delay: Duration) -> Self {
        let (state, _) = watch::channel(UiSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                state,
                timer: Mutex::new(MessageTimer::default()),
                dismiss_delay,
                fade_delay,
            }),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> UiSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Receive every state change.
    pub fn subscribe(&self) -> watch::Receiver<UiSnapshot> {
        self.inner.state.subscribe()
    }

    // ========== Loading ==========

    /// `true` registers one more in-flight operation, `false` retires one.
    pub fn set_loading(&self, loading: bool) {
        self.inner.state.send_modify(|state| {
            if loading {
                state.in_flight += 1;
            } else {
                state.in_flight = state.in_flight.saturating_sub(1);
            }
        });
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading()
    }

    /// Mark a request as started; it is finished when the guard drops.
    pub fn begin_request(&self) -> LoadingGuard {
        self.set_loading(true);
        LoadingGuard {
            ui: self.clone(),
        }
    }

    // ========== Messages ==========

    /// Show `text` and (re)start the auto-dismiss timer.
    pub fn set_message(&self, text: impl Into<String>, kind: MessageKind) {
        let text = text.into();
        debug!(kind = ?kind, "UI message set");

        let mut timer = self.inner.lock_timer();
        timer.generation += 1;
        let generation = timer.generation;

        self.inner.state.send_modify(|state| {
            state.message = Some(text);
            state.message_kind = Some(kind);
            state.visible = true;
        });

        let inner = Arc::clone(&self.inner);
        schedule(&mut timer, async move {
            tokio::time::sleep(inner.dismiss_delay).await;
            if !inner.hide_if_current(generation) {
                return;
            }
            tokio::time::sleep(inner.fade_delay).await;
            inner.reset_if_current(generation);
        });
    }

    /// Hide the message now and drop its text after the fade delay.
    pub fn clear_message(&self) {
        let mut timer = self.inner.lock_timer();
        timer.generation += 1;
        let generation = timer.generation;

        self.inner.state.send_modify(|state| state.visible = false);

        let inner = Arc::clone(&self.inner);
        let scheduled = schedule(&mut timer, async move {
            tokio::time::sleep(inner.fade_delay).await;
            inner.reset_if_current(generation);
        });
        if !scheduled {
            self.inner.state.send_modify(reset_message);
        }
    }
}

/// Replace the pending timer with `task`. Returns `false` outside a runtime.
fn schedule<F>(timer: &mut MessageTimer, task: F) -> bool
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    if let Some(previous) = timer.pending.take() {
        previous.abort();
    }

    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            timer.pending = Some(handle.spawn(task));
            true
        }
        Err(_) => {
            warn!("No async runtime; UI message timers disabled");
            false
        }
    }
}

fn reset_message(state: &mut UiSnapshot) {
    state.message = None;
    state.message_kind = None;
    state.visible = false;
}

impl Inner {
    fn lock_timer(&self) -> MutexGuard<'_, MessageTimer> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn hide_if_current(&self, generation: u64) -> bool {
        let timer = self.lock_timer();
        if timer.generation != generation {
            return false;
        }
        self.state.send_modify(|state| state.visible = false);
        true
    }

    fn reset_if_current(&self, generation: u64) {
        let timer = self.lock_timer();
        if timer.generation != generation {
            return;
        }
        self.state.send_modify(reset_message);
    }
}

impl std::fmt::Debug for UiBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiBroadcaster")
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

/// Retires one in-flight request when dropped.
#[must_use = "the request counts as finished as soon as the guard is dropped"]
pub struct LoadingGuard {
    ui: UiBroadcaster,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.ui.set_loading(false);
    }
}
