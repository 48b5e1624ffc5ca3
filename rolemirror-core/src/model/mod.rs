//! Domain model for mirrored staff status
//!
//! Everything here is a live snapshot handed out by a [`Directory`](crate::directory::Directory).
//! Nothing is cached between reconciliations.
//!
//! ## Architecture
//!
//! - **Space**: an external group context (a "server" or "guild")
//! - **Member**: one user's record inside one Space, with the markers attached to it
//! - **StatusMarker**: a named role a Space defines
//! - **TrackedMarker**: the single marker name being mirrored from source to mirror

pub mod marker;
pub mod space;
pub mod types;

pub use marker::{TrackedMarker, DEFAULT_TRACKED_MARKER};
pub use space::{Member, Space, SpaceSide, StatusMarker};
pub use types::{MarkerId, SpaceId, UserId};
