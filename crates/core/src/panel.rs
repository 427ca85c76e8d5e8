// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collapsed/expanded state of the view's panel sections

use serde::{Deserialize, Serialize};

/// Persisted collapse flags for the view's sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelState {
    #[serde(default)]
    pub running_collapsed: bool,
    #[serde(default)]
    pub completed_collapsed: bool,
    #[serde(default)]
    pub starred_collapsed: bool,
    #[serde(default)]
    pub recent_collapsed: bool,
}

/// Partial update; only the present fields are merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelStateUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running_collapsed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_collapsed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starred_collapsed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_collapsed: Option<bool>,
}

impl PanelState {
    /// Merge a partial update into this state.
    pub fn merge(&mut self, update: &PanelStateUpdate) {
        if let Some(v) = update.running_collapsed {
            self.running_collapsed = v;
        }
        if let Some(v) = update.completed_collapsed {
            self.completed_collapsed = v;
        }
        if let Some(v) = update.starred_collapsed {
            self.starred_collapsed = v;
        }
        if let Some(v) = update.recent_collapsed {
            self.recent_collapsed = v;
        }
    }
}

#[cfg(test)]
#[path = "panel_tests.rs"]
mod tests;
