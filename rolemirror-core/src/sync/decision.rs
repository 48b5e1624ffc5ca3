//! Two-sided diff between source and mirror

use serde::{Deserialize, Serialize};

/// What the mirror needs for its status to equal the source's
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Correction {
    NoChange,
    Grant,
    Revoke,
}

/// Presence of the tracked marker on both sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncDecision {
    pub has_in_source: bool,
    pub has_in_mirror: bool,
}

impl SyncDecision {
    pub fn needs_sync(&self) -> bool {
        self.has_in_source != self.has_in_mirror
    }

    pub fn correction(&self) -> Correction {
        match (self.has_in_source, self.has_in_mirror) {
            (true, false) => Correction::Grant,
            (false, true) => Correction::Revoke,
            _ => Correction::NoChange,
        }
    }
}

/// Compare the two sides
pub fn decide(has_in_source: bool, has_in_mirror: bool) -> SyncDecision {
    SyncDecision { has_in_source, has_in_mirror }
}
