//! Membership events that trigger reconciliation
//!
//! The transport that produces these events lives outside this crate. It
//! forwards two kinds of notification:
//!
//! - a user joined a space
//! - a member's markers changed in a space
//!
//! [`EventHandler`] decides which of them warrant a reconciliation and runs it.

pub mod handler;

pub use handler::EventHandler;

use crate::model::{Member, SpaceId, StatusMarker, UserId};
use serde::{Deserialize, Serialize};

/// A membership notification from one of the two spaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MembershipEvent {
    /// A user joined `space_id`
    Joined { space_id: SpaceId, member: Member },

    /// A member's markers changed in `space_id`.
    ///
    /// `previous_markers` is `None` when the transport only had a partial
    /// record of the member before the change.
    Updated {
        space_id: SpaceId,
        #[serde(default)]
        previous_markers: Option<Vec<StatusMarker>>,
        member: Member,
    },
}

impl MembershipEvent {
    pub fn space_id(&self) -> &SpaceId {
        match self {
            MembershipEvent::Joined { space_id, .. } | MembershipEvent::Updated { space_id, .. } => {
                space_id
            }
        }
    }

    pub fn member(&self) -> &Member {
        match self {
            MembershipEvent::Joined { member, .. } | MembershipEvent::Updated { member, .. } => member,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.member().user_id
    }
}
