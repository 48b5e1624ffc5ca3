//! Event filtering and dispatch into the engine

use super::MembershipEvent;
use crate::config::SyncTriggers;
use crate::directory::{Directory, Mutator};
use crate::metrics::{self, EventCollector, EventLoopStats};
use crate::model::{SpaceSide, StatusMarker, UserId};
use crate::sync::{RoleSyncEngine, SyncAction, SyncError, SyncOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Why an event did not lead to a reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    ForeignSpace,
    WrongSide,
    TriggerDisabled,
    MarkerUnchanged,
}

/// Turns membership events into reconciliations.
///
/// Joins are acted on in the mirror space, marker changes in the source
/// space. Everything else is ignored.
pub struct EventHandler<D, M> {
    engine: Arc<RoleSyncEngine<D, M>>,
    triggers: SyncTriggers,
    call_timeout: Option<Duration>,
    stats: EventCollector,
}

impl<D, M> EventHandler<D, M>
where
    D: Directory,
    M: Mutator,
{
    pub fn new(engine: Arc<RoleSyncEngine<D, M>>, triggers: SyncTriggers) -> Self {
        Self { engine, triggers, call_timeout: None, stats: EventCollector::new() }
    }

    /// Bound each reconciliation; an expired budget yields a failed outcome
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn engine(&self) -> &Arc<RoleSyncEngine<D, M>> {
        &self.engine
    }

    pub fn stats(&self) -> EventLoopStats {
        self.stats.snapshot()
    }

    /// Handle one event. Returns `None` when the event was ignored.
    pub async fn handle(&self, event: &MembershipEvent) -> Option<SyncOutcome> {
        self.stats.inc_received();
        let log = self.engine.log_context();
        let member = event.member();

        if let Err(skip) = self.filter(event) {
            self.stats.inc_ignored();
            metrics::record_event("ignored");
            log.in_scope(|| debug!(user = %member.username, reason = ?skip, "Ignoring membership event"));
            return None;
        }

        match event {
            MembershipEvent::Joined { .. } => {
                log.in_scope(|| info!("User {} joined mirror space", member.username))
            }
            MembershipEvent::Updated { .. } => log.in_scope(|| {
                let change = if self.engine.tracked_marker().is_carried_by(member) { "added" } else { "removed" };
                info!("{} role {} for {} in source space", self.engine.tracked_marker(), change, member.username)
            }),
        }

        let outcome = self.reconcile(event.user_id(), &member.username).await;
        self.stats.inc_handled();

        match outcome.action {
            SyncAction::Added | SyncAction::Removed => {
                metrics::record_event("handled");
                log.in_scope(|| info!("Mirror updated for {}: {}", member.username, outcome.action));
            }
            SyncAction::NoChange => {
                metrics::record_event("handled");
                log.in_scope(|| debug!("No {} role sync needed for {}", self.engine.tracked_marker(), member.username));
            }
            SyncAction::Error => {
                self.stats.inc_failed();
                metrics::record_event("failed");
                log.in_scope(|| {
                    warn!(
                        "Failed to sync {} role for {}: {}",
                        self.engine.tracked_marker(),
                        member.username,
                        outcome.error.as_deref().unwrap_or("unknown error")
                    )
                });
            }
        }

        Some(outcome)
    }

    fn filter(&self, event: &MembershipEvent) -> Result<(), Skip> {
        let side = self.engine.spaces().side_of(event.space_id()).ok_or(Skip::ForeignSpace)?;

        match event {
            MembershipEvent::Joined { .. } => {
                if side != SpaceSide::Mirror {
                    return Err(Skip::WrongSide);
                }
                if !self.triggers.sync_on_join {
                    return Err(Skip::TriggerDisabled);
                }
            }
            MembershipEvent::Updated { previous_markers, member, .. } => {
                if side != SpaceSide::Source {
                    return Err(Skip::WrongSide);
                }
                if !self.triggers.sync_on_marker_change {
                    return Err(Skip::TriggerDisabled);
                }
                if !self.marker_changed(previous_markers.as_deref(), &member.markers) {
                    return Err(Skip::MarkerUnchanged);
                }
            }
        }

        Ok(())
    }

    /// An unknown previous state always counts as a change
    fn marker_changed(&self, previous: Option<&[StatusMarker]>, current: &[StatusMarker]) -> bool {
        let tracked = self.engine.tracked_marker();
        match previous {
            Some(previous) => tracked.find_in(previous).is_some() != tracked.find_in(current).is_some(),
            None => true,
        }
    }

    async fn reconcile(&self, user_id: &UserId, username: &str) -> SyncOutcome {
        let Some(after) = self.call_timeout else {
            return self.engine.sync_status(user_id).await;
        };

        match tokio::time::timeout(after, self.engine.sync_status(user_id)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let outcome = SyncOutcome::failed(user_id.clone(), Some(username), &SyncError::TimedOut { after });
                metrics::record_outcome(&outcome);
                outcome
            }
        }
    }

    /// Consume events until every sender is dropped.
    ///
    /// Runs an existing-member sweep first when `sweep_on_startup` is set.
    pub async fn run(&self, mut events: mpsc::Receiver<MembershipEvent>) -> EventLoopStats {
        if self.triggers.sweep_on_startup {
            if let Err(err) = self.engine.sync_existing_members().await {
                self.engine.log_context().in_scope(|| warn!("Startup sweep aborted: {}", err));
            }
        }

        while let Some(event) = events.recv().await {
            self.handle(&event).await;
        }

        self.engine.log_context().in_scope(|| info!("Event channel closed, stopping"));
        self.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use crate::logging::LogContext;
    use crate::model::{Member, Space, SpaceId, TrackedMarker};
    use crate::sync::SpacePair;

    fn setup(triggers: SyncTriggers) -> (Arc<InMemoryDirectory>, EventHandler<InMemoryDirectory, InMemoryDirectory>) {
        let directory = Arc::new(InMemoryDirectory::new());
        directory.add_space(Space::new("a", "Source"));
        directory.add_space(Space::new("b", "Mirror"));
        directory.define_marker(&SpaceId::from("a"), StatusMarker::new("ra", "Staff"));
        directory.define_marker(&SpaceId::from("b"), StatusMarker::new("rb", "Staff"));
        directory.upsert_member(Member::new("1", "alice", "a").with_marker(StatusMarker::new("ra", "Staff")));
        directory.upsert_member(Member::new("1", "alice", "b"));

        let engine = Arc::new(RoleSyncEngine::new(
            directory.clone(),
            directory.clone(),
            SpacePair::new("a", "b"),
            TrackedMarker::default(),
            LogContext::silent(),
        ));
        (directory, EventHandler::new(engine, triggers))
    }

    fn joined(space: &str) -> MembershipEvent {
        MembershipEvent::Joined { space_id: SpaceId::from(space), member: Member::new("1", "alice", space) }
    }

    #[tokio::test]
    async fn test_join_in_mirror_reconciles() {
        let (directory, handler) = setup(SyncTriggers::default());
        let outcome = handler.handle(&joined("b")).await.unwrap();

        assert_eq!(outcome.action, SyncAction::Added);
        assert_eq!(directory.call_counts().grant, 1);
    }

    #[tokio::test]
    async fn test_join_in_source_is_ignored() {
        let (directory, handler) = setup(SyncTriggers::default());
        assert!(handler.handle(&joined("a")).await.is_none());
        assert!(handler.handle(&joined("elsewhere")).await.is_none());

        assert_eq!(directory.call_counts().get_space, 0);
        assert_eq!(handler.stats().ignored, 2);
    }

    #[tokio::test]
    async fn test_join_trigger_disabled() {
        let triggers = SyncTriggers { sync_on_join: false, ..SyncTriggers::default() };
        let (_, handler) = setup(triggers);
        assert!(handler.handle(&joined("b")).await.is_none());
    }

    #[tokio::test]
    async fn test_update_without_marker_flip_is_ignored() {
        let (_, handler) = setup(SyncTriggers::default());
        let staff = StatusMarker::new("ra", "Staff");
        let event = MembershipEvent::Updated {
            space_id: SpaceId::from("a"),
            previous_markers: Some(vec![staff.clone()]),
            member: Member::new("1", "alice", "a")
                .with_marker(staff)
                .with_marker(StatusMarker::new("rx", "Nickname Color")),
        };

        assert!(handler.handle(&event).await.is_none());
    }

    #[tokio::test]
    async fn test_update_with_marker_flip_reconciles() {
        let (_, handler) = setup(SyncTriggers::default());
        let event = MembershipEvent::Updated {
            space_id: SpaceId::from("a"),
            previous_markers: Some(vec![]),
            member: Member::new("1", "alice", "a").with_marker(StatusMarker::new("ra", "STAFF")),
        };

        let outcome = handler.handle(&event).await.unwrap();
        assert_eq!(outcome.action, SyncAction::Added);
    }

    #[tokio::test]
    async fn test_update_with_unknown_previous_state_reconciles() {
        let (_, handler) = setup(SyncTriggers::default());
        let event = MembershipEvent::Updated {
            space_id: SpaceId::from("a"),
            previous_markers: None,
            member: Member::new("1", "alice", "a"),
        };

        // The live source record still carries the marker, so the mirror gains it
        let outcome = handler.handle(&event).await.unwrap();
        assert_eq!(outcome.action, SyncAction::Added);
    }

    #[tokio::test]
    async fn test_update_in_mirror_is_ignored() {
        let (_, handler) = setup(SyncTriggers::default());
        let event = MembershipEvent::Updated {
            space_id: SpaceId::from("b"),
            previous_markers: None,
            member: Member::new("1", "alice", "b"),
        };

        assert!(handler.handle(&event).await.is_none());
    }

    #[tokio::test]
    async fn test_failed_outcome_is_counted() {
        let (directory, handler) = setup(SyncTriggers::default());
        directory.fail_mutations_for(&UserId::from("1"));

        let outcome = handler.handle(&joined("b")).await.unwrap();
        assert!(!outcome.success);

        let stats = handler.stats();
        assert_eq!(stats.handled, 1);
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn test_run_consumes_until_closed() {
        let triggers = SyncTriggers { sweep_on_startup: true, ..SyncTriggers::default() };
        let (directory, handler) = setup(triggers);
        let (tx, rx) = mpsc::channel(8);

        tx.send(joined("a")).await.unwrap();
        tx.send(joined("b")).await.unwrap();
        drop(tx);

        let stats = handler.run(rx).await;
        assert_eq!(stats.received, 2);
        assert_eq!(stats.handled, 1);
        assert_eq!(stats.ignored, 1);
        // Startup sweep granted; the join event then found nothing to do
        assert_eq!(directory.call_counts().grant, 1);
    }
}
