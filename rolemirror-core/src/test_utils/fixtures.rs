//! Test fixtures for creating common test objects
//!
//! Provides a builder for a seeded source/mirror directory and a factory for
//! an engine wired to it.

use crate::directory::InMemoryDirectory;
use crate::logging::LogContext;
use crate::model::{Member, Space, SpaceId, StatusMarker, TrackedMarker};
use crate::sync::{RoleSyncEngine, SpacePair};
use std::sync::Arc;

pub const SOURCE_SPACE: &str = "source-space";
pub const MIRROR_SPACE: &str = "mirror-space";
pub const SOURCE_MARKER_ID: &str = "source-staff";
pub const MIRROR_MARKER_ID: &str = "mirror-staff";

/// Engine type used throughout the tests
pub type TestEngine = RoleSyncEngine<InMemoryDirectory, InMemoryDirectory>;

/// Where a fixture member exists and whether it carries the marker there
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Absent,
    Plain,
    Staff,
}

/// Builder for a directory holding one source and one mirror space
pub struct PairFixtureBuilder {
    source_marker_name: String,
    mirror_marker_name: Option<String>,
    members: Vec<(String, String, Presence, Presence)>,
}

impl PairFixtureBuilder {
    pub fn new() -> Self {
        Self {
            source_marker_name: "Staff".to_string(),
            mirror_marker_name: Some("Staff".to_string()),
            members: Vec::new(),
        }
    }

    /// Name of the marker as the source space spells it
    pub fn source_marker(mut self, name: impl Into<String>) -> Self {
        self.source_marker_name = name.into();
        self
    }

    /// Name of the marker in the mirror; `None` leaves it undefined there
    pub fn mirror_marker(mut self, name: Option<&str>) -> Self {
        self.mirror_marker_name = name.map(str::to_owned);
        self
    }

    pub fn member(
        mut self,
        user_id: impl Into<String>,
        username: impl Into<String>,
        source: Presence,
        mirror: Presence,
    ) -> Self {
        self.members.push((user_id.into(), username.into(), source, mirror));
        self
    }

    pub fn build(self) -> Arc<InMemoryDirectory> {
        let directory = Arc::new(InMemoryDirectory::new());
        let source_id = SpaceId::from(SOURCE_SPACE);
        let mirror_id = SpaceId::from(MIRROR_SPACE);

        directory.add_space(Space::new(SOURCE_SPACE, "Source Space"));
        directory.add_space(Space::new(MIRROR_SPACE, "Mirror Space"));

        let source_marker = StatusMarker::new(SOURCE_MARKER_ID, self.source_marker_name);
        directory.define_marker(&source_id, source_marker.clone());

        let mirror_marker = self.mirror_marker_name.map(|name| StatusMarker::new(MIRROR_MARKER_ID, name));
        if let Some(marker) = &mirror_marker {
            directory.define_marker(&mirror_id, marker.clone());
        }

        for (user_id, username, source, mirror) in self.members {
            if let Some(member) = place(&user_id, &username, SOURCE_SPACE, source, Some(&source_marker)) {
                directory.upsert_member(member);
            }
            if let Some(member) = place(&user_id, &username, MIRROR_SPACE, mirror, mirror_marker.as_ref()) {
                directory.upsert_member(member);
            }
        }

        directory
    }
}

impl Default for PairFixtureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn place(
    user_id: &str,
    username: &str,
    space: &str,
    presence: Presence,
    marker: Option<&StatusMarker>,
) -> Option<Member> {
    let member = Member::new(user_id, username, space);
    match (presence, marker) {
        (Presence::Absent, _) => None,
        (Presence::Staff, Some(marker)) => Some(member.with_marker(marker.clone())),
        _ => Some(member),
    }
}

/// Engine over `directory` that logs nowhere
pub fn test_engine(directory: &Arc<InMemoryDirectory>) -> TestEngine {
    test_engine_with_log(directory, LogContext::silent())
}

/// Engine over `directory` with an explicit log context
pub fn test_engine_with_log(directory: &Arc<InMemoryDirectory>, log: LogContext) -> TestEngine {
    RoleSyncEngine::new(
        directory.clone(),
        directory.clone(),
        SpacePair::new(SOURCE_SPACE, MIRROR_SPACE),
        TrackedMarker::default(),
        log,
    )
}
