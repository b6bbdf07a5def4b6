// Copyright 2025 the Fascicle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Manager configuration.

use crate::types::Color;

/// Tunables for a [`SelectionManager`](crate::SelectionManager).
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionConfig {
    /// Colour reported for fibers no branch selects.
    pub base_color: Color,
    /// Colour given to newly created branches.
    pub default_branch_color: Color,
    /// Drain the edit queue at the start of every selection query.
    ///
    /// When `false`, queued edits only take effect through
    /// [`apply_pending_edits`](crate::SelectionManager::apply_pending_edits).
    pub apply_edits_on_query: bool,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            base_color: Color::WHITE,
            default_branch_color: Color::RED,
            apply_edits_on_query: true,
        }
    }
}
