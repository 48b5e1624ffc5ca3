//! Staff status reconciliation
//!
//! The engine compares the tracked marker on a user's record in the source
//! Space against the mirror Space and applies at most one correction to the
//! mirror. The comparison itself lives in [`decision`] and does no I/O.

pub mod decision;
pub mod engine;
pub mod error;
pub mod outcome;

pub use decision::{decide, Correction, SyncDecision};
pub use engine::{RoleSyncEngine, SpacePair};
pub use error::SyncError;
pub use outcome::{SweepReport, SyncAction, SyncOutcome, UNKNOWN_USERNAME};
