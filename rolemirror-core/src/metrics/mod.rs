//! Metrics for reconciliation outcomes
//!
//! Counters go through the `metrics` facade. Nothing is recorded unless the
//! embedding process installs a recorder.

use crate::sync::{SweepReport, SyncOutcome};
use metrics::{counter, describe_counter};

mod collector;

pub use collector::{EventCollector, EventLoopStats};

/// Counter for single-user outcomes, labelled by `action`
pub const SYNC_OUTCOMES: &str = "rolemirror.sync.outcomes";
/// Completed bulk sweeps
pub const SWEEPS_COMPLETED: &str = "rolemirror.sweep.completed";
/// Members that failed during completed sweeps
pub const SWEEP_ERRORS: &str = "rolemirror.sweep.errors";
/// Sweeps aborted before any member was processed
pub const SWEEPS_ABORTED: &str = "rolemirror.sweep.aborted";
/// Membership events received by the event layer, labelled by `result`
pub const EVENTS: &str = "rolemirror.events";

/// Register metric descriptions
pub fn init_metrics() {
    describe_counter!(SYNC_OUTCOMES, "Reconciliation outcomes by action");
    describe_counter!(SWEEPS_COMPLETED, "Number of completed bulk sweeps");
    describe_counter!(SWEEP_ERRORS, "Members that failed during completed sweeps");
    describe_counter!(SWEEPS_ABORTED, "Number of sweeps aborted on space resolution");
    describe_counter!(EVENTS, "Membership events by handling result");
}

pub fn record_outcome(outcome: &SyncOutcome) {
    counter!(SYNC_OUTCOMES, "action" => outcome.action.as_str()).increment(1);
}

pub fn record_sweep(report: &SweepReport) {
    counter!(SWEEPS_COMPLETED).increment(1);
    counter!(SWEEP_ERRORS).increment(report.errors as u64);
}

pub fn record_sweep_aborted() {
    counter!(SWEEPS_ABORTED).increment(1);
}

pub fn record_event(result: &'static str) {
    counter!(EVENTS, "result" => result).increment(1);
}
