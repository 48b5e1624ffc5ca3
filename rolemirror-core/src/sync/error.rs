//! Reconciliation failure taxonomy

use crate::directory::{DirectoryError, MutationError};
use crate::model::{SpaceId, SpaceSide, TrackedMarker, UserId};
use thiserror::Error;

/// Why a reconciliation could not complete.
///
/// None of these are retried by the engine. A later event for the same user
/// re-runs the whole reconciliation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    /// One of the two spaces could not be resolved
    #[error("Could not fetch {side} space {space_id}: {reason}")]
    SpaceUnavailable { side: SpaceSide, space_id: SpaceId, reason: String },

    /// The user is not a member of one or both spaces
    #[error("Member {user_id} not found in one or both servers")]
    MemberAbsent { user_id: UserId },

    /// The member lookup itself failed
    #[error("Could not fetch member {user_id} from {side} space: {reason}")]
    MemberLookupFailed { side: SpaceSide, user_id: UserId, reason: String },

    /// The tracked marker is not defined in the mirror space
    #[error("{marker} role not found in server {space}")]
    MarkerUndefined { marker: TrackedMarker, space: String },

    /// Grant or revoke was rejected
    #[error("Failed to {verb} {marker} role: {reason}")]
    MutationFailed { verb: &'static str, marker: TrackedMarker, reason: String },

    /// The caller's time budget ran out before the reconciliation finished
    #[error("Reconciliation timed out after {}", humantime::format_duration(*.after))]
    TimedOut { after: std::time::Duration },

    /// Anything unexpected, including panics inside collaborators
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    pub(crate) fn space(side: SpaceSide, space_id: &SpaceId, err: DirectoryError) -> Self {
        SyncError::SpaceUnavailable { side, space_id: space_id.clone(), reason: err.to_string() }
    }

    pub(crate) fn lookup(side: SpaceSide, user_id: &UserId, err: DirectoryError) -> Self {
        SyncError::MemberLookupFailed { side, user_id: user_id.clone(), reason: err.to_string() }
    }

    pub(crate) fn grant(marker: &TrackedMarker, err: MutationError) -> Self {
        SyncError::MutationFailed { verb: "add", marker: marker.clone(), reason: err.to_string() }
    }

    pub(crate) fn revoke(marker: &TrackedMarker, err: MutationError) -> Self {
        SyncError::MutationFailed { verb: "remove", marker: marker.clone(), reason: err.to_string() }
    }

    /// Short label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::SpaceUnavailable { .. } => "space_unavailable",
            SyncError::MemberAbsent { .. } => "member_absent",
            SyncError::MemberLookupFailed { .. } => "member_lookup_failed",
            SyncError::MarkerUndefined { .. } => "marker_undefined",
            SyncError::MutationFailed { .. } => "mutation_failed",
            SyncError::TimedOut { .. } => "timed_out",
            SyncError::Internal(_) => "internal",
        }
    }
}
