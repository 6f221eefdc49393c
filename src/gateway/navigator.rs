// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Navigation primitive used for the post-teardown redirect.

use tracing::info;

/// Performs a hard navigation to an app route.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Navigator that only records the redirect in the log.
///
/// Used by headless hosts (CLI, tests) that have no router to drive.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, route: &str) {
        info!(route, "Redirecting after session teardown");
    }
}
