//! rolemirror - mirror one staff marker from a source space onto a mirror space
//!
//! The [`sync::RoleSyncEngine`] reads live state through a
//! [`directory::Directory`], decides whether the mirror differs from the
//! source, and applies at most one correction through a
//! [`directory::Mutator`]. [`events::EventHandler`] decides which membership
//! notifications should trigger it.

pub mod config;
pub mod directory;
pub mod events;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod sync;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use logging::{init_logging, LogContext, LogLevel};
pub use sync::{RoleSyncEngine, SyncAction, SyncOutcome};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Ensure the main exports are accessible
        let _ = LogLevel::Info;
        let _ = SyncAction::NoChange;
        let _ = LogContext::global();
    }
}
