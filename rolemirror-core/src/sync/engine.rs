//! Reconciliation engine
//!
//! Stateless apart from the two space ids, the tracked marker and the log
//! context. Every call re-fetches spaces, members and the marker.

use super::decision::{decide, Correction};
use super::error::SyncError;
use super::outcome::{SweepReport, SyncOutcome};
use crate::config::SyncConfig;
use crate::directory::{Directory, Mutator};
use crate::logging::LogContext;
use crate::metrics;
use crate::model::{Member, Space, SpaceId, SpaceSide, TrackedMarker, UserId};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// The source and mirror space ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpacePair {
    pub source: SpaceId,
    pub mirror: SpaceId,
}

impl SpacePair {
    pub fn new(source: impl Into<SpaceId>, mirror: impl Into<SpaceId>) -> Self {
        Self { source: source.into(), mirror: mirror.into() }
    }

    pub fn get(&self, side: SpaceSide) -> &SpaceId {
        match side {
            SpaceSide::Source => &self.source,
            SpaceSide::Mirror => &self.mirror,
        }
    }

    /// Which side a space plays, if it is one of the pair
    pub fn side_of(&self, space_id: &SpaceId) -> Option<SpaceSide> {
        if space_id == &self.source {
            Some(SpaceSide::Source)
        } else if space_id == &self.mirror {
            Some(SpaceSide::Mirror)
        } else {
            None
        }
    }
}

/// Mirrors the tracked marker from the source space onto the mirror space
pub struct RoleSyncEngine<D, M> {
    directory: Arc<D>,
    mutator: Arc<M>,
    spaces: SpacePair,
    tracked: TrackedMarker,
    log: LogContext,
}

impl<D, M> RoleSyncEngine<D, M>
where
    D: Directory,
    M: Mutator,
{
    pub fn new(
        directory: Arc<D>,
        mutator: Arc<M>,
        spaces: SpacePair,
        tracked: TrackedMarker,
        log: LogContext,
    ) -> Self {
        Self { directory, mutator, spaces, tracked, log }
    }

    /// Build from validated configuration
    pub fn from_config(directory: Arc<D>, mutator: Arc<M>, config: &SyncConfig, log: LogContext) -> Self {
        Self::new(
            directory,
            mutator,
            SpacePair::new(config.source_space_id.clone(), config.mirror_space_id.clone()),
            TrackedMarker::new(config.tracked_marker.clone()),
            log,
        )
    }

    pub fn spaces(&self) -> &SpacePair {
        &self.spaces
    }

    pub fn tracked_marker(&self) -> &TrackedMarker {
        &self.tracked
    }

    pub fn log_context(&self) -> &LogContext {
        &self.log
    }

    /// Reconcile one user.
    ///
    /// Never fails: every problem, including a panic inside a collaborator,
    /// comes back as an outcome with `success == false`.
    pub async fn sync_status(&self, user_id: &UserId) -> SyncOutcome {
        let outcome = match AssertUnwindSafe(self.reconcile(user_id)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let err = SyncError::Internal(panic_message(&*panic));
                self.log.in_scope(|| error!(user_id = %user_id, "Reconciliation panicked: {}", err));
                SyncOutcome::failed(user_id.clone(), None, &err)
            }
        };

        metrics::record_outcome(&outcome);
        outcome
    }

    async fn reconcile(&self, user_id: &UserId) -> SyncOutcome {
        let mut username = None;
        match self.try_reconcile(user_id, &mut username).await {
            Ok(outcome) => outcome,
            Err(err) => SyncOutcome::failed(user_id.clone(), username.as_deref(), &err),
        }
    }

    async fn try_reconcile(
        &self,
        user_id: &UserId,
        username: &mut Option<String>,
    ) -> Result<SyncOutcome, SyncError> {
        let source = self.resolve(SpaceSide::Source).await?;
        let mirror = self.resolve(SpaceSide::Mirror).await?;

        let source_lookup = self.directory.get_member(&source, user_id).await;
        let mirror_lookup = self.directory.get_member(&mirror, user_id).await;

        *username = known_username(&source_lookup).or_else(|| known_username(&mirror_lookup));

        let source_member = source_lookup.map_err(|e| self.lookup_failed(SpaceSide::Source, user_id, e))?;
        let mirror_member = mirror_lookup.map_err(|e| self.lookup_failed(SpaceSide::Mirror, user_id, e))?;

        let (source_member, mirror_member) = match (source_member, mirror_member) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                let err = SyncError::MemberAbsent { user_id: user_id.clone() };
                self.log.in_scope(|| warn!("{}", err));
                return Err(err);
            }
        };

        let marker = self
            .directory
            .find_marker(&mirror, &self.tracked)
            .await
            .map_err(|e| SyncError::space(SpaceSide::Mirror, &mirror.id, e))?;

        let Some(marker) = marker else {
            let err = SyncError::MarkerUndefined {
                marker: self.tracked.clone(),
                space: display_name(&mirror),
            };
            self.log.in_scope(|| warn!("{}", err));
            return Err(err);
        };

        let tag = source_member.username.clone();
        let decision = decide(
            self.tracked.is_carried_by(&source_member),
            self.tracked.is_carried_by(&mirror_member),
        );

        match decision.correction() {
            Correction::NoChange => {
                self.log.in_scope(|| debug!("No {} role sync needed for {}", self.tracked, tag));
                Ok(SyncOutcome::unchanged(user_id.clone(), tag))
            }
            Correction::Grant => {
                if let Err(e) = self.mutator.grant(&mirror_member, &marker).await {
                    return Err(self.mutation_failed(&mirror_member, SyncError::grant(&self.tracked, e)));
                }
                self.log.in_scope(|| {
                    info!("Added {} role to {} in {}", self.tracked, tag, display_name(&mirror))
                });
                Ok(SyncOutcome::changed(user_id.clone(), tag, true))
            }
            Correction::Revoke => {
                if let Err(e) = self.mutator.revoke(&mirror_member, &marker).await {
                    return Err(self.mutation_failed(&mirror_member, SyncError::revoke(&self.tracked, e)));
                }
                self.log.in_scope(|| {
                    info!("Removed {} role from {} in {}", self.tracked, tag, display_name(&mirror))
                });
                Ok(SyncOutcome::changed(user_id.clone(), tag, false))
            }
        }
    }

    async fn resolve(&self, side: SpaceSide) -> Result<Space, SyncError> {
        let space_id = self.spaces.get(side);
        self.directory.get_space(space_id).await.map_err(|e| {
            let err = SyncError::space(side, space_id, e);
            self.log.in_scope(|| error!("{}", err));
            err
        })
    }

    fn lookup_failed(&self, side: SpaceSide, user_id: &UserId, err: crate::directory::DirectoryError) -> SyncError {
        let err = SyncError::lookup(side, user_id, err);
        self.log.in_scope(|| warn!("{}", err));
        err
    }

    fn mutation_failed(&self, member: &Member, err: SyncError) -> SyncError {
        self.log.in_scope(|| error!(user = %member.username, "{}", err));
        err
    }

    /// Reconcile every member of the source space.
    ///
    /// Both spaces must resolve before any member is touched; otherwise the
    /// sweep aborts with the resolution error.
    pub async fn sync_all_members(&self) -> Result<SweepReport, SyncError> {
        self.log.in_scope(|| info!("Starting full {} role synchronization", self.tracked));

        let source = self.begin_sweep(SpaceSide::Source).await?;
        self.begin_sweep(SpaceSide::Mirror).await?;

        let members = self.list_for_sweep(SpaceSide::Source, &source).await?;
        let report = self.sweep(members).await;

        self.log.in_scope(|| {
            info!(
                added = report.added,
                removed = report.removed,
                errors = report.errors,
                "Full synchronization completed. Added: {}, Removed: {}, Errors: {}",
                report.added,
                report.removed,
                report.errors
            )
        });
        metrics::record_sweep(&report);
        Ok(report)
    }

    /// Reconcile every member already present in the mirror space
    pub async fn sync_existing_members(&self) -> Result<SweepReport, SyncError> {
        self.log.in_scope(|| info!("Syncing existing members in mirror space"));

        let mirror = self.begin_sweep(SpaceSide::Mirror).await?;
        let members = self.list_for_sweep(SpaceSide::Mirror, &mirror).await?;
        let report = self.sweep(members).await;

        self.log.in_scope(|| {
            info!(
                synced = report.synced(),
                errors = report.errors,
                "Existing member sync completed. Synced {} members.",
                report.synced()
            )
        });
        metrics::record_sweep(&report);
        Ok(report)
    }

    async fn begin_sweep(&self, side: SpaceSide) -> Result<Space, SyncError> {
        self.resolve(side).await.map_err(|err| {
            self.log.in_scope(|| error!("Could not fetch {} space for sweep", side));
            metrics::record_sweep_aborted();
            err
        })
    }

    async fn list_for_sweep(&self, side: SpaceSide, space: &Space) -> Result<Vec<Member>, SyncError> {
        self.directory.list_members(space).await.map_err(|e| {
            let err = SyncError::space(side, &space.id, e);
            self.log.in_scope(|| error!("Error during sweep: {}", err));
            metrics::record_sweep_aborted();
            err
        })
    }

    async fn sweep(&self, members: Vec<Member>) -> SweepReport {
        let mut report = SweepReport::default();
        for member in members {
            let outcome = self.sync_status(&member.user_id).await;
            report.record(&outcome);
        }
        report
    }
}

fn known_username<E>(lookup: &Result<Option<Member>, E>) -> Option<String> {
    match lookup {
        Ok(Some(member)) => Some(member.username.clone()),
        _ => None,
    }
}

fn display_name(space: &Space) -> String {
    if space.name.is_empty() {
        space.id.to_string()
    } else {
        space.name.clone()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "collaborator panicked".to_string()
    }
}
