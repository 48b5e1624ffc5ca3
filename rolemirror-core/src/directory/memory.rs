//! In-memory Directory and Mutator
//!
//! Holds spaces, markers and members behind a mutex so the engine can be
//! exercised without a live transport. Supports fault injection and counts
//! every call it receives.

use super::snapshot::{DirectorySnapshot, SnapshotError};
use super::{Directory, DirectoryError, MutationError, Mutator};
use crate::model::{Member, Space, SpaceId, StatusMarker, TrackedMarker, UserId};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// Number of calls received per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub get_space: usize,
    pub get_member: usize,
    pub find_marker: usize,
    pub list_members: usize,
    pub grant: usize,
    pub revoke: usize,
}

impl CallCounts {
    /// Grant plus revoke calls
    pub fn mutations(&self) -> usize {
        self.grant + self.revoke
    }
}

#[derive(Debug, Clone)]
struct SpaceState {
    space: Space,
    markers: Vec<StatusMarker>,
    members: Vec<Member>,
}

#[derive(Debug, Default)]
struct State {
    spaces: BTreeMap<SpaceId, SpaceState>,
    unreachable: HashSet<SpaceId>,
    failing_mutations: HashSet<UserId>,
    panicking_lookups: HashSet<UserId>,
    counts: CallCounts,
}

/// Directory backed by process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    state: Arc<Mutex<State>>,
}

impl InMemoryDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory from a validated snapshot
    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Result<Self, SnapshotError> {
        snapshot.validate()?;

        let directory = Self::new();
        {
            let mut state = directory.state();
            for space in snapshot.spaces {
                let members = space
                    .members
                    .into_iter()
                    .map(|m| Member {
                        markers: space
                            .markers
                            .iter()
                            .filter(|marker| m.markers.contains(&marker.id))
                            .cloned()
                            .collect(),
                        user_id: m.user_id,
                        username: m.username,
                        space_id: space.id.clone(),
                    })
                    .collect();

                state.spaces.insert(
                    space.id.clone(),
                    SpaceState {
                        space: Space { id: space.id, name: space.name },
                        markers: space.markers,
                        members,
                    },
                );
            }
        }

        Ok(directory)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A panic inside a lookup (see `panic_on_lookup`) must not wedge the directory
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a space (replaces any space with the same id)
    pub fn add_space(&self, space: Space) {
        self.state().spaces.insert(
            space.id.clone(),
            SpaceState { space, markers: Vec::new(), members: Vec::new() },
        );
    }

    /// Define a marker in a space. Returns false if the space is unknown.
    pub fn define_marker(&self, space_id: &SpaceId, marker: StatusMarker) -> bool {
        match self.state().spaces.get_mut(space_id) {
            Some(space) => {
                space.markers.retain(|m| m.id != marker.id);
                space.markers.push(marker);
                true
            }
            None => false,
        }
    }

    /// Add or replace a member. The member's `space_id` selects the space.
    pub fn upsert_member(&self, member: Member) -> bool {
        match self.state().spaces.get_mut(&member.space_id) {
            Some(space) => {
                match space.members.iter_mut().find(|m| m.user_id == member.user_id) {
                    Some(existing) => *existing = member,
                    None => space.members.push(member),
                }
                true
            }
            None => false,
        }
    }

    /// Remove a member from a space
    pub fn remove_member(&self, space_id: &SpaceId, user_id: &UserId) -> bool {
        match self.state().spaces.get_mut(space_id) {
            Some(space) => {
                let before = space.members.len();
                space.members.retain(|m| &m.user_id != user_id);
                space.members.len() != before
            }
            None => false,
        }
    }

    /// Current record of a member, bypassing call counting
    pub fn member(&self, space_id: &SpaceId, user_id: &UserId) -> Option<Member> {
        self.state()
            .spaces
            .get(space_id)
            .and_then(|s| s.members.iter().find(|m| &m.user_id == user_id).cloned())
    }

    /// Make every lookup against a space fail as unreachable
    pub fn set_unreachable(&self, space_id: &SpaceId, unreachable: bool) {
        let mut state = self.state();
        if unreachable {
            state.unreachable.insert(space_id.clone());
        } else {
            state.unreachable.remove(space_id);
        }
    }

    /// Reject every grant/revoke targeting this user
    pub fn fail_mutations_for(&self, user_id: &UserId) {
        self.state().failing_mutations.insert(user_id.clone());
    }

    /// Panic when this user's member record is looked up
    pub fn panic_on_lookup(&self, user_id: &UserId) {
        self.state().panicking_lookups.insert(user_id.clone());
    }

    pub fn call_counts(&self) -> CallCounts {
        self.state().counts
    }

    pub fn reset_call_counts(&self) {
        self.state().counts = CallCounts::default();
    }
}

fn check_reachable(state: &State, space_id: &SpaceId) -> Result<(), DirectoryError> {
    if state.unreachable.contains(space_id) {
        return Err(DirectoryError::Unreachable {
            space: space_id.clone(),
            reason: "space marked unreachable".to_string(),
        });
    }
    Ok(())
}

fn space_state<'a>(state: &'a State, space_id: &SpaceId) -> Result<&'a SpaceState, DirectoryError> {
    check_reachable(state, space_id)?;
    state
        .spaces
        .get(space_id)
        .ok_or_else(|| DirectoryError::SpaceNotFound(space_id.clone()))
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn get_space(&self, space_id: &SpaceId) -> Result<Space, DirectoryError> {
        let mut state = self.state();
        state.counts.get_space += 1;
        space_state(&state, space_id).map(|s| s.space.clone())
    }

    async fn get_member(
        &self,
        space: &Space,
        user_id: &UserId,
    ) -> Result<Option<Member>, DirectoryError> {
        let (result, panic) = {
            let mut state = self.state();
            state.counts.get_member += 1;
            let panic = state.panicking_lookups.contains(user_id);
            let result = space_state(&state, &space.id)
                .map(|s| s.members.iter().find(|m| &m.user_id == user_id).cloned());
            (result, panic)
        };

        if panic {
            panic!("injected lookup failure for user {}", user_id);
        }
        result
    }

    async fn find_marker(
        &self,
        space: &Space,
        marker: &TrackedMarker,
    ) -> Result<Option<StatusMarker>, DirectoryError> {
        let mut state = self.state();
        state.counts.find_marker += 1;
        space_state(&state, &space.id).map(|s| marker.find_in(&s.markers).cloned())
    }

    async fn list_members(&self, space: &Space) -> Result<Vec<Member>, DirectoryError> {
        let mut state = self.state();
        state.counts.list_members += 1;
        space_state(&state, &space.id).map(|s| s.members.clone())
    }
}

impl InMemoryDirectory {
    fn mutate(
        &self,
        member: &Member,
        marker: &StatusMarker,
        grant: bool,
    ) -> Result<(), MutationError> {
        let mut state = self.state();
        if grant {
            state.counts.grant += 1;
        } else {
            state.counts.revoke += 1;
        }

        if state.failing_mutations.contains(&member.user_id) {
            return Err(MutationError::Rejected(format!(
                "injected failure for user {}",
                member.user_id
            )));
        }
        if state.unreachable.contains(&member.space_id) {
            return Err(MutationError::Transport(format!(
                "space {} unreachable",
                member.space_id
            )));
        }

        let space = state
            .spaces
            .get_mut(&member.space_id)
            .ok_or_else(|| MutationError::TargetMissing(format!("space {}", member.space_id)))?;

        if !space.markers.iter().any(|m| m.id == marker.id) {
            return Err(MutationError::TargetMissing(format!("marker {}", marker.id)));
        }

        let record = space
            .members
            .iter_mut()
            .find(|m| m.user_id == member.user_id)
            .ok_or_else(|| MutationError::TargetMissing(format!("member {}", member.user_id)))?;

        let present = record.has_marker_id(&marker.id);
        if grant && !present {
            record.markers.push(marker.clone());
        } else if !grant && present {
            record.markers.retain(|m| m.id != marker.id);
        }

        Ok(())
    }
}

#[async_trait]
impl Mutator for InMemoryDirectory {
    async fn grant(&self, member: &Member, marker: &StatusMarker) -> Result<(), MutationError> {
        self.mutate(member, marker, true)
    }

    async fn revoke(&self, member: &Member, marker: &StatusMarker) -> Result<(), MutationError> {
        self.mutate(member, marker, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (InMemoryDirectory, Space, StatusMarker) {
        let directory = InMemoryDirectory::new();
        let space = Space::new("b", "Mirror");
        let marker = StatusMarker::new("rb", "staff");

        directory.add_space(space.clone());
        directory.define_marker(&space.id, marker.clone());
        directory.upsert_member(Member::new("1", "alice", "b"));

        (directory, space, marker)
    }

    #[tokio::test]
    async fn test_get_space_unknown() {
        let directory = InMemoryDirectory::new();
        let result = directory.get_space(&SpaceId::from("nope")).await;
        assert!(matches!(result, Err(DirectoryError::SpaceNotFound(_))));
    }

    #[tokio::test]
    async fn test_unreachable_space() {
        let (directory, space, _) = seeded();
        directory.set_unreachable(&space.id, true);

        let result = directory.get_space(&space.id).await;
        assert!(matches!(result, Err(DirectoryError::Unreachable { .. })));

        directory.set_unreachable(&space.id, false);
        assert!(directory.get_space(&space.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_absent_member_is_none() {
        let (directory, space, _) = seeded();
        let member = directory.get_member(&space, &UserId::from("2")).await.unwrap();
        assert!(member.is_none());
    }

    #[tokio::test]
    async fn test_find_marker_case_insensitive() {
        let (directory, space, marker) = seeded();
        let found = directory.find_marker(&space, &TrackedMarker::new("STAFF")).await.unwrap();
        assert_eq!(found, Some(marker));
    }

    #[tokio::test]
    async fn test_grant_and_revoke_are_idempotent() {
        let (directory, space, marker) = seeded();
        let member = directory.member(&space.id, &UserId::from("1")).unwrap();

        directory.grant(&member, &marker).await.unwrap();
        directory.grant(&member, &marker).await.unwrap();
        let record = directory.member(&space.id, &member.user_id).unwrap();
        assert_eq!(record.markers.len(), 1);

        directory.revoke(&member, &marker).await.unwrap();
        directory.revoke(&member, &marker).await.unwrap();
        let record = directory.member(&space.id, &member.user_id).unwrap();
        assert!(record.markers.is_empty());

        assert_eq!(directory.call_counts().mutations(), 4);
    }

    #[tokio::test]
    async fn test_injected_mutation_failure() {
        let (directory, space, marker) = seeded();
        let member = directory.member(&space.id, &UserId::from("1")).unwrap();
        directory.fail_mutations_for(&member.user_id);

        let result = directory.grant(&member, &marker).await;
        assert!(matches!(result, Err(MutationError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_grant_to_departed_member() {
        let (directory, space, marker) = seeded();
        let member = directory.member(&space.id, &UserId::from("1")).unwrap();
        directory.remove_member(&space.id, &member.user_id);

        let result = directory.grant(&member, &marker).await;
        assert!(matches!(result, Err(MutationError::TargetMissing(_))));
    }

    #[test]
    fn test_from_snapshot_resolves_marker_refs() {
        let json = r#"{ "spaces": [ {
            "id": "a", "name": "Source",
            "markers": [{ "id": "ra", "name": "Staff" }, { "id": "rx", "name": "Other" }],
            "members": [{ "user_id": "1", "username": "alice", "markers": ["ra"] }]
        } ] }"#;
        let snapshot: DirectorySnapshot = serde_json::from_str(json).unwrap();
        let directory = InMemoryDirectory::from_snapshot(snapshot).unwrap();

        let alice = directory.member(&SpaceId::from("a"), &UserId::from("1")).unwrap();
        assert_eq!(alice.markers, vec![StatusMarker::new("ra", "Staff")]);
        assert_eq!(alice.space_id, SpaceId::from("a"));
    }

    #[test]
    fn test_from_snapshot_rejects_repeated_member() {
        let json = r#"{ "spaces": [ {
            "id": "a", "name": "Source",
            "markers": [{ "id": "ra", "name": "Staff" }],
            "members": [
                { "user_id": "1", "username": "alice", "markers": ["ra"] },
                { "user_id": "1", "username": "alice" }
            ]
        } ] }"#;
        let snapshot: DirectorySnapshot = serde_json::from_str(json).unwrap();

        assert!(matches!(
            InMemoryDirectory::from_snapshot(snapshot),
            Err(SnapshotError::DuplicateMember { .. })
        ));
    }
}
