//! Results handed back to callers

use super::error::SyncError;
use crate::model::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Username reported when no member record could be fetched
pub const UNKNOWN_USERNAME: &str = "unknown";

/// What a reconciliation did to the mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Added,
    Removed,
    NoChange,
    Error,
}

impl SyncAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::Added => "added",
            SyncAction::Removed => "removed",
            SyncAction::NoChange => "no_change",
            SyncAction::Error => "error",
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of reconciling one user.
///
/// Built only through [`changed`](Self::changed), [`unchanged`](Self::unchanged)
/// and [`failed`](Self::failed): `success` is false exactly when `action` is
/// `Error`, and only then is `error` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub success: bool,
    pub user_id: UserId,
    pub username: String,
    pub action: SyncAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncOutcome {
    /// A correction was applied. `granted` selects added vs removed.
    pub fn changed(user_id: UserId, username: impl Into<String>, granted: bool) -> Self {
        Self {
            success: true,
            user_id,
            username: username.into(),
            action: if granted { SyncAction::Added } else { SyncAction::Removed },
            error: None,
        }
    }

    pub fn unchanged(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            success: true,
            user_id,
            username: username.into(),
            action: SyncAction::NoChange,
            error: None,
        }
    }

    pub fn failed(user_id: UserId, username: Option<&str>, error: &SyncError) -> Self {
        Self {
            success: false,
            user_id,
            username: username.unwrap_or(UNKNOWN_USERNAME).to_string(),
            action: SyncAction::Error,
            error: Some(error.to_string()),
        }
    }

    /// True for `Added` and `Removed`
    pub fn is_change(&self) -> bool {
        matches!(self.action, SyncAction::Added | SyncAction::Removed)
    }
}

/// Aggregate counts from a bulk sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub scanned: usize,
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub errors: usize,
}

impl SweepReport {
    pub fn record(&mut self, outcome: &SyncOutcome) {
        self.scanned += 1;
        match outcome.action {
            SyncAction::Added => self.added += 1,
            SyncAction::Removed => self.removed += 1,
            SyncAction::NoChange => self.unchanged += 1,
            SyncAction::Error => self.errors += 1,
        }
    }

    /// Members whose mirror status was corrected
    pub fn synced(&self) -> usize {
        self.added + self.removed
    }
}
