//! The single tracked marker and its equality rule

use super::space::{Member, StatusMarker};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker name mirrored when nothing else is configured
pub const DEFAULT_TRACKED_MARKER: &str = "Staff";

/// Name of the one marker kept in sync between the two Spaces.
///
/// Comparison is an exact match after lowercasing both sides, so `"STAFF"`
/// and `"staff"` are the same marker while `"Staff Lead"` is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackedMarker(String);

impl TrackedMarker {
    pub fn new(name: impl Into<String>) -> Self {
        TrackedMarker(name.into())
    }

    /// The configured name, as written
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Case-insensitive exact match against a marker name
    pub fn matches(&self, name: &str) -> bool {
        self.0.to_lowercase() == name.to_lowercase()
    }

    /// Pick the tracked marker out of a list of markers
    pub fn find_in<'a>(&self, markers: &'a [StatusMarker]) -> Option<&'a StatusMarker> {
        markers.iter().find(|m| self.matches(&m.name))
    }

    /// Does this member carry the tracked marker?
    pub fn is_carried_by(&self, member: &Member) -> bool {
        self.find_in(&member.markers).is_some()
    }
}

impl Default for TrackedMarker {
    fn default() -> Self {
        TrackedMarker::new(DEFAULT_TRACKED_MARKER)
    }
}

impl fmt::Display for TrackedMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
