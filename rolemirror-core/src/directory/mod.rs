//! Directory and Mutator - collaborators the engine reconciles through
//!
//! The engine never talks to a transport directly. It composes two
//! capabilities supplied by the caller:
//!
//! ```text
//! RoleSyncEngine
//!       |
//!       +---> Directory (trait)   spaces, members, markers
//!       |
//!       +---> Mutator (trait)     grant / revoke a marker on a member
//!       |
//!       +---> InMemoryDirectory   both traits, for tests and snapshot runs
//! ```

pub mod memory;
pub mod snapshot;

pub use memory::{CallCounts, InMemoryDirectory};
pub use snapshot::{DirectorySnapshot, SnapshotError, SpaceSnapshot};

use crate::model::{Member, Space, SpaceId, StatusMarker, TrackedMarker, UserId};
use async_trait::async_trait;
use thiserror::Error;

/// Lookup failures reported by a [`Directory`]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryError {
    /// The Space is unknown to the directory
    #[error("Space not found: {0}")]
    SpaceNotFound(SpaceId),

    /// The Space exists but could not be reached
    #[error("Space {space} unreachable: {reason}")]
    Unreachable { space: SpaceId, reason: String },

    /// Any other transport failure
    #[error("Directory error: {0}")]
    Transport(String),
}

/// Failures reported by a [`Mutator`]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MutationError {
    /// The directory refused the change (missing permission, hierarchy, ...)
    #[error("Mutation rejected: {0}")]
    Rejected(String),

    /// The target member or marker disappeared between lookup and mutation
    #[error("Mutation target missing: {0}")]
    TargetMissing(String),

    /// Transport failure
    #[error("Mutation transport error: {0}")]
    Transport(String),
}

/// Read-only view of spaces, their members and their markers.
///
/// Every call goes to the live source; implementations must not serve
/// membership from a cache the engine cannot invalidate.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Resolve a Space handle
    async fn get_space(&self, space_id: &SpaceId) -> Result<Space, DirectoryError>;

    /// Fetch a user's record in a Space. `Ok(None)` means "not a member".
    async fn get_member(
        &self,
        space: &Space,
        user_id: &UserId,
    ) -> Result<Option<Member>, DirectoryError>;

    /// Locate the tracked marker among the markers a Space defines
    async fn find_marker(
        &self,
        space: &Space,
        marker: &TrackedMarker,
    ) -> Result<Option<StatusMarker>, DirectoryError>;

    /// Fresh snapshot of every member of a Space, in a stable order
    async fn list_members(&self, space: &Space) -> Result<Vec<Member>, DirectoryError>;
}

/// Attaches and detaches markers.
///
/// Both operations are idempotent: granting a marker the member already
/// carries, or revoking one it does not carry, succeeds without a change.
#[async_trait]
pub trait Mutator: Send + Sync {
    async fn grant(&self, member: &Member, marker: &StatusMarker) -> Result<(), MutationError>;

    async fn revoke(&self, member: &Member, marker: &StatusMarker) -> Result<(), MutationError>;
}
