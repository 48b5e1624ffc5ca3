//! Event loop counters

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of what the event layer has seen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLoopStats {
    pub received: u64,
    pub handled: u64,
    pub ignored: u64,
    pub failed: u64,
}

/// Lock-free counters shared by concurrent event handlers
#[derive(Debug, Default)]
pub struct EventCollector {
    received: AtomicU64,
    handled: AtomicU64,
    ignored: AtomicU64,
    failed: AtomicU64,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    /// An event led to a reconciliation
    pub fn inc_handled(&self) {
        self.handled.fetch_add(1, Ordering::Relaxed);
    }

    /// An event was filtered out before reconciliation
    pub fn inc_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
    }

    /// A handled event produced a failed outcome
    pub fn inc_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> EventLoopStats {
        EventLoopStats {
            received: self.received.load(Ordering::Relaxed),
            handled: self.handled.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
