//! Serialisable directory snapshots
//!
//! A snapshot describes spaces, the markers they define and their members.
//! It seeds an [`InMemoryDirectory`](super::InMemoryDirectory) for offline
//! runs of the CLI and for fixtures in tests.

use crate::model::{MarkerId, SpaceId, StatusMarker, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot file: {0}")]
    FileReadError(String),

    #[error("Failed to parse snapshot: {0}")]
    ParseError(String),

    #[error("Duplicate space in snapshot: {0}")]
    DuplicateSpace(SpaceId),

    #[error("Member {user} listed more than once in space {space}")]
    DuplicateMember { space: SpaceId, user: UserId },

    #[error("Member {user} in space {space} references unknown marker {marker}")]
    UnknownMarker { space: SpaceId, user: UserId, marker: MarkerId },
}

/// Every space known to a directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    #[serde(default)]
    pub spaces: Vec<SpaceSnapshot>,
}

/// One space, its marker definitions and its membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpaceSnapshot {
    pub id: SpaceId,

    #[serde(default)]
    pub name: String,

    /// Markers the space defines
    #[serde(default)]
    pub markers: Vec<StatusMarker>,

    /// Members in iteration order
    #[serde(default)]
    pub members: Vec<MemberSnapshot>,
}

/// A member; markers are referenced by id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberSnapshot {
    pub user_id: UserId,

    pub username: String,

    #[serde(default)]
    pub markers: Vec<MarkerId>,
}

impl DirectorySnapshot {
    /// Load a snapshot. `.toml` files are parsed as TOML, anything else as JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SnapshotError::FileReadError(format!("{}: {}", path.display(), e)))?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let snapshot: Self = if is_toml {
            toml::from_str(&contents).map_err(|e| SnapshotError::ParseError(e.to_string()))?
        } else {
            serde_json::from_str(&contents).map_err(|e| SnapshotError::ParseError(e.to_string()))?
        };

        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check for duplicate spaces, duplicate members within a space and
    /// dangling marker references
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let mut seen: Vec<&SpaceId> = Vec::new();

        for space in &self.spaces {
            if seen.contains(&&space.id) {
                return Err(SnapshotError::DuplicateSpace(space.id.clone()));
            }
            seen.push(&space.id);

            let mut users: HashSet<&UserId> = HashSet::new();
            for member in &space.members {
                if !users.insert(&member.user_id) {
                    return Err(SnapshotError::DuplicateMember {
                        space: space.id.clone(),
                        user: member.user_id.clone(),
                    });
                }

                for marker_id in &member.markers {
                    if !space.markers.iter().any(|m| &m.id == marker_id) {
                        return Err(SnapshotError::UnknownMarker {
                            space: space.id.clone(),
                            user: member.user_id.clone(),
                            marker: marker_id.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "spaces": [
            {
                "id": "a",
                "name": "Source",
                "markers": [{ "id": "ra", "name": "Staff" }],
                "members": [{ "user_id": "1", "username": "alice", "markers": ["ra"] }]
            },
            {
                "id": "b",
                "name": "Mirror",
                "markers": [{ "id": "rb", "name": "staff" }],
                "members": [{ "user_id": "1", "username": "alice" }]
            }
        ]
    }"#;

    #[test]
    fn test_parse_json_snapshot() {
        let snapshot: DirectorySnapshot = serde_json::from_str(SAMPLE).unwrap();
        assert!(snapshot.validate().is_ok());
        assert_eq!(snapshot.spaces.len(), 2);
        assert!(snapshot.spaces[1].members[0].markers.is_empty());
    }

    #[test]
    fn test_unknown_marker_rejected() {
        let mut snapshot: DirectorySnapshot = serde_json::from_str(SAMPLE).unwrap();
        snapshot.spaces[1].members[0].markers.push(MarkerId::from("nope"));

        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::UnknownMarker { .. })
        ));
    }

    #[test]
    fn test_duplicate_space_rejected() {
        let mut snapshot: DirectorySnapshot = serde_json::from_str(SAMPLE).unwrap();
        let dup = snapshot.spaces[0].clone();
        snapshot.spaces.push(dup);

        assert!(matches!(snapshot.validate(), Err(SnapshotError::DuplicateSpace(_))));
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let mut snapshot: DirectorySnapshot = serde_json::from_str(SAMPLE).unwrap();
        let mut dup = snapshot.spaces[0].members[0].clone();
        dup.markers.clear();
        snapshot.spaces[0].members.push(dup);

        match snapshot.validate() {
            Err(SnapshotError::DuplicateMember { space, user }) => {
                assert_eq!(space, SpaceId::from("a"));
                assert_eq!(user, UserId::from("1"));
            }
            other => panic!("expected DuplicateMember, got {:?}", other),
        }
    }

    #[test]
    fn test_same_user_in_different_spaces_allowed() {
        let snapshot: DirectorySnapshot = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(snapshot.spaces[0].members[0].user_id, snapshot.spaces[1].members[0].user_id);
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[[spaces]]
id = "a"
name = "Source"
markers = [{{ id = "ra", name = "Staff" }}]
members = [{{ user_id = "1", username = "alice", markers = ["ra"] }}]
"#
        )
        .unwrap();

        let snapshot = DirectorySnapshot::from_file(file.path()).unwrap();
        assert_eq!(snapshot.spaces[0].members[0].username, "alice");
    }

    #[test]
    fn test_missing_file() {
        let result = DirectorySnapshot::from_file("/definitely/not/here.json");
        assert!(matches!(result, Err(SnapshotError::FileReadError(_))));
    }
}
