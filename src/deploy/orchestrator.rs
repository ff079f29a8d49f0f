// ABOUTME: Top-level deployment state machine: start, sync, abort, finish, service, report.
// ABOUTME: Consults the lock driver for legality and delegates phases to the other drivers.

use snafu::{OptionExt, ResultExt, ensure};
use std::sync::Arc;

use super::error::*;
use crate::confirm::{ConfirmationGate, ConfirmationSource};
use crate::diagnostics::{Diagnostics, Warning};
use crate::drivers::{Drivers, LockInfo, ServiceAction, ServiceReport, SyncArgs};
use crate::fleet::{FleetReport, SyncScope};
use crate::git::Vcs;
use crate::output::Output;
use crate::types::{BatchSpec, DeployTag, DeployTimestamp, Phase, RepoName};

/// Where a deployment stands.
///
/// Only the lock is persisted, so [`Orchestrator::state`] can observe
/// `NotStarted` and `Started`; the other states are reported by the
/// operation that reaches them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentState {
    NotStarted,
    Started(LockInfo),
    Synced(DeployTag),
    Finished,
    Aborted,
}

/// Result of a state transition plus the non-fatal warnings it produced.
#[derive(Debug)]
pub struct Outcome {
    pub state: DeploymentState,
    pub diagnostics: Diagnostics,
}

impl Outcome {
    fn new(state: DeploymentState, diagnostics: Diagnostics) -> Self {
        Self { state, diagnostics }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AbortOptions {
    /// Leave the working tree as it is.
    pub noreset: bool,
    /// Abort a deployment started by someone else.
    pub force: bool,
}

/// Which fleet progress to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Sync,
    Service,
}

pub struct Orchestrator {
    repo: RepoName,
    user: String,
    vcs: Arc<dyn Vcs>,
    drivers: Drivers,
    prompt: Arc<dyn ConfirmationSource>,
    output: Output,
}

impl Orchestrator {
    pub fn new(
        repo: RepoName,
        user: impl Into<String>,
        vcs: Arc<dyn Vcs>,
        drivers: Drivers,
        prompt: Arc<dyn ConfirmationSource>,
        output: Output,
    ) -> Self {
        Self {
            repo,
            user: user.into(),
            vcs,
            drivers,
            prompt,
            output,
        }
    }

    pub fn repo(&self) -> &RepoName {
        &self.repo
    }

    pub async fn state(&self) -> DeploymentState {
        match self.drivers.lock.check_lock().await {
            Some(info) => DeploymentState::Started(info),
            None => DeploymentState::NotStarted,
        }
    }

    /// Take the lock and mark the starting point with a start tag.
    pub async fn start(&self) -> Result<Outcome, OrchestratorError> {
        if let Some(info) = self.drivers.lock.check_lock().await {
            return AlreadyStartedSnafu {
                holder: info.describe_holder(),
            }
            .fail();
        }

        self.drivers
            .lock
            .add_lock(&self.user)
            .await
            .context(StartLockSnafu)?;

        let tag = self.new_tag(Phase::Start);
        if let Err(source) = self.vcs.create_tag(&tag.name()).await {
            if let Err(e) = self.drivers.lock.remove_lock().await {
                tracing::warn!("Failed to release the lock after a failed start: {}", e);
            }
            let empty = matches!(self.vcs.current_head().await, Ok(None));
            ensure!(!empty, EmptyRepositorySnafu { tag: tag.name() });
            return Err(source).context(StartTagSnafu { tag: tag.name() });
        }

        self.output.progress(&format!("Tagged {tag}"));
        let info = self
            .drivers
            .lock
            .check_lock()
            .await
            .unwrap_or_else(|| LockInfo::new(&self.user));
        Ok(Outcome::new(
            DeploymentState::Started(info),
            Diagnostics::default(),
        ))
    }

    /// Drop the deployment, by default resetting the tree to the last start tag.
    pub async fn abort(&self, options: AbortOptions) -> Result<Outcome, OrchestratorError> {
        let info = self
            .drivers
            .lock
            .check_lock()
            .await
            .context(NothingToAbortSnafu)?;
        let mut diagnostics = Diagnostics::default();

        if info.is_unknown() {
            diagnostics.warn(Warning::unknown_holder(
                "the deployment lock does not name a holder; aborting anyway",
            ));
        } else if !info.is_held_by(&self.user) {
            ensure!(
                options.force,
                LockedByOtherSnafu {
                    holder: info.describe_holder(),
                }
            );
            tracing::debug!("Forcing abort of {}'s deployment", info.describe_holder());
        }

        if !options.noreset {
            self.reset_to_start(&mut diagnostics).await;
        }

        self.drivers
            .lock
            .remove_lock()
            .await
            .context(AbortReleaseSnafu)?;
        Ok(Outcome::new(DeploymentState::Aborted, diagnostics))
    }

    async fn reset_to_start(&self, diagnostics: &mut Diagnostics) {
        let tags = match self.vcs.list_tags().await {
            Ok(tags) => tags,
            Err(e) => {
                diagnostics.warn(Warning::reset_failed(format!(
                    "failed to list tags, working tree not reset: {e}"
                )));
                return;
            }
        };

        let Some(start) = DeployTag::latest(tags.iter().map(String::as_str), &self.repo, Phase::Start)
        else {
            diagnostics.warn(Warning::reset_failed(format!(
                "no start tag for {}, working tree not reset",
                self.repo
            )));
            return;
        };

        match self.vcs.reset_to(&start.name()).await {
            Ok(()) => self.output.progress(&format!("Reset working tree to {start}")),
            Err(e) => diagnostics.warn(Warning::reset_failed(format!(
                "failed to reset working tree to {start}: {e}"
            ))),
        }
    }

    /// Tag the current tree and walk the fleet through fetch and checkout.
    ///
    /// The lock is released only when the sync driver succeeds.
    pub async fn sync(&self, args: SyncArgs) -> Result<Outcome, OrchestratorError> {
        self.drivers
            .lock
            .check_lock()
            .await
            .context(SyncNotStartedSnafu)?;

        let dirty = self.vcs.is_dirty().await.context(TreeInspectSnafu)?;
        ensure!(!dirty, DirtyTreeSnafu);

        let tag = self.new_tag(Phase::Sync);
        self.vcs
            .create_tag(&tag.name())
            .await
            .context(SyncTagSnafu { tag: tag.name() })?;
        self.output.progress(&format!("Tagged {tag}"));

        let gate = ConfirmationGate::new(
            self.drivers.report.as_ref(),
            self.prompt.as_ref(),
            &self.output,
        );
        let diagnostics = self
            .drivers
            .sync
            .sync(&tag, &args, &gate)
            .await
            .context(SyncFailedSnafu)?;

        self.drivers
            .lock
            .remove_lock()
            .await
            .context(SyncReleaseSnafu)?;
        Ok(Outcome::new(DeploymentState::Synced(tag), diagnostics))
    }

    /// Release the lock without touching the tree or the fleet.
    pub async fn finish(&self) -> Result<Outcome, OrchestratorError> {
        self.drivers
            .lock
            .check_lock()
            .await
            .context(FinishNotStartedSnafu)?;
        self.drivers
            .lock
            .remove_lock()
            .await
            .context(FinishReleaseSnafu)?;
        Ok(Outcome::new(
            DeploymentState::Finished,
            Diagnostics::default(),
        ))
    }

    /// Run a fleet-wide service action.
    pub async fn service(
        &self,
        action: &str,
        batch: Option<BatchSpec>,
    ) -> Result<ServiceReport, OrchestratorError> {
        let action: ServiceAction = action
            .parse()
            .map_err(|action| OrchestratorError::UnknownAction { action })?;

        let service = &self.drivers.service;
        let result = match action {
            ServiceAction::Start => service.start(batch).await,
            ServiceAction::Stop => service.stop(batch).await,
            ServiceAction::Restart => service.restart(batch).await,
            ServiceAction::Reload => service.reload(batch).await,
        };
        result.context(ServiceFailedSnafu {
            action: action.as_str(),
        })
    }

    /// Report fleet progress for the last synced tag, or for the last restart.
    pub async fn report(
        &self,
        kind: ReportKind,
        detailed: bool,
    ) -> Result<FleetReport, OrchestratorError> {
        match kind {
            ReportKind::Sync => {
                let record = self
                    .drivers
                    .sync
                    .deploy_info()
                    .await
                    .context(NoDeployRecordSnafu)?;
                tracing::debug!("Reporting on {} synced by {}", record.tag, record.user);
                self.drivers
                    .report
                    .report_sync(&record.tag, SyncScope::Full, detailed)
                    .await
                    .context(ReportReadSnafu)
            }
            ReportKind::Service => self
                .drivers
                .report
                .report_service(detailed)
                .await
                .context(ReportReadSnafu),
        }
    }

    fn new_tag(&self, phase: Phase) -> DeployTag {
        DeployTag::new(self.repo.clone(), phase, DeployTimestamp::now())
    }
}
