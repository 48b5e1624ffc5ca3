//! Which events drive reconciliation

use serde::{Deserialize, Serialize};

/// Switches for the event layer.
///
/// By default reconciliation runs only when a member joins the mirror space
/// or their tracked marker changes in the source space; no sweep is started
/// on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncTriggers {
    /// Reconcile a user when they join the mirror space
    pub sync_on_join: bool,

    /// Reconcile a user when the tracked marker flips in the source space
    pub sync_on_marker_change: bool,

    /// Run an existing-member sweep before handling events
    pub sweep_on_startup: bool,
}

impl Default for SyncTriggers {
    fn default() -> Self {
        Self {
            sync_on_join: true,
            sync_on_marker_change: true,
            sweep_on_startup: false,
        }
    }
}

impl SyncTriggers {
    /// True when no event can ever start a reconciliation
    pub fn all_disabled(&self) -> bool {
        !self.sync_on_join && !self.sync_on_marker_change && !self.sweep_on_startup
    }
}
