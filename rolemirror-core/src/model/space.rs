//! Space, member and marker snapshots

use super::types::{MarkerId, SpaceId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the mirrored pair a Space plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceSide {
    /// Space A, the source of truth
    Source,
    /// Space B, corrected to follow the source
    Mirror,
}

impl SpaceSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpaceSide::Source => "source",
            SpaceSide::Mirror => "mirror",
        }
    }
}

impl fmt::Display for SpaceSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to an external Space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    /// Unique identifier
    pub id: SpaceId,

    /// Human-readable name
    pub name: String,
}

impl Space {
    pub fn new(id: impl Into<SpaceId>, name: impl Into<String>) -> Self {
        Space { id: id.into(), name: name.into() }
    }
}

/// A named role defined by a Space
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusMarker {
    /// Identifier, unique within the owning Space
    pub id: MarkerId,

    /// Display name; matched case-insensitively
    pub name: String,
}

impl StatusMarker {
    pub fn new(id: impl Into<MarkerId>, name: impl Into<String>) -> Self {
        StatusMarker { id: id.into(), name: name.into() }
    }
}

/// One user's record inside one Space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// The user this record belongs to
    pub user_id: UserId,

    /// Human-readable tag, used in outcomes and logs
    pub username: String,

    /// The Space this record was fetched from
    pub space_id: SpaceId,

    /// Markers currently attached to the user in this Space
    #[serde(default)]
    pub markers: Vec<StatusMarker>,
}

impl Member {
    pub fn new(
        user_id: impl Into<UserId>,
        username: impl Into<String>,
        space_id: impl Into<SpaceId>,
    ) -> Self {
        Member {
            user_id: user_id.into(),
            username: username.into(),
            space_id: space_id.into(),
            markers: Vec::new(),
        }
    }

    /// Attach a marker (builder style)
    pub fn with_marker(mut self, marker: StatusMarker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Check whether a marker with this id is attached
    pub fn has_marker_id(&self, id: &MarkerId) -> bool {
        self.markers.iter().any(|m| &m.id == id)
    }
}
