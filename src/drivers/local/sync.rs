// ABOUTME: Local sync driver: deploy record, server info, fleet fetch and checkout.
// ABOUTME: Each step consumes the run and returns the next phase on success.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use super::phase::{
    CheckingOut, DeployFileWritten, Done, FetchConfirmed, Fetching, Idle, ServerInfoPublished,
};
use super::record::DeployRecord;
use crate::confirm::{ConfirmationGate, Stage, Verdict};
use crate::diagnostics::{Diagnostics, Warning};
use crate::dispatch::{CommandDispatcher, FleetFunction};
use crate::drivers::{SyncArgs, SyncDriver, SyncError};
use crate::git::Vcs;
use crate::types::{DeployTag, RepoName};

pub struct LocalSyncDriver {
    repo: RepoName,
    user: String,
    vcs: Arc<dyn Vcs>,
    dispatcher: Arc<dyn CommandDispatcher>,
    record_path: PathBuf,
    checkout_submodules: bool,
}

impl std::fmt::Debug for LocalSyncDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSyncDriver")
            .field("repo", &self.repo)
            .field("record_path", &self.record_path)
            .field("checkout_submodules", &self.checkout_submodules)
            .finish_non_exhaustive()
    }
}

impl LocalSyncDriver {
    pub fn new(
        repo: RepoName,
        user: impl Into<String>,
        vcs: Arc<dyn Vcs>,
        dispatcher: Arc<dyn CommandDispatcher>,
        record_path: PathBuf,
    ) -> Self {
        Self {
            repo,
            user: user.into(),
            vcs,
            dispatcher,
            record_path,
            checkout_submodules: false,
        }
    }

    /// Also tag and republish every submodule.
    pub fn with_submodules(mut self, enabled: bool) -> Self {
        self.checkout_submodules = enabled;
        self
    }

    /// Begin a sync of `tag`.
    pub fn begin<'a>(&'a self, tag: &'a DeployTag, args: SyncArgs) -> SyncRun<'a, Idle> {
        SyncRun {
            driver: self,
            tag,
            args,
            diagnostics: Diagnostics::default(),
            state: Idle,
        }
    }

    fn argument(&self, function: FleetFunction, args: &SyncArgs) -> String {
        match function {
            FleetFunction::Checkout => {
                let force = if args.force { "True" } else { "False" };
                format!("{},{}", self.repo, force)
            }
            FleetFunction::Fetch | FleetFunction::Restart => self.repo.to_string(),
        }
    }

    async fn dispatch(&self, function: FleetFunction, args: &SyncArgs) -> Result<(), SyncError> {
        let argument = self.argument(function, args);
        let reply = self
            .dispatcher
            .dispatch(function, &argument)
            .await
            .map_err(|source| SyncError::Dispatch { function, source })?;
        tracing::debug!("{} dispatched for {}: {}", function, self.repo, reply.trim());
        Ok(())
    }
}

/// A sync in progress, parameterized by its current phase.
#[derive(Debug)]
pub struct SyncRun<'a, S> {
    driver: &'a LocalSyncDriver,
    tag: &'a DeployTag,
    args: SyncArgs,
    diagnostics: Diagnostics,
    state: S,
}

impl<'a, S> SyncRun<'a, S> {
    fn transition<T>(self, state: T) -> SyncRun<'a, T> {
        SyncRun {
            driver: self.driver,
            tag: self.tag,
            args: self.args,
            diagnostics: self.diagnostics,
            state,
        }
    }

    pub fn tag(&self) -> &DeployTag {
        self.tag
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Ask about `stage` until the operator proceeds or rejects,
    /// re-dispatching the stage command on every retry.
    async fn confirm_stage(
        &self,
        stage: Stage,
        function: FleetFunction,
        gate: &ConfirmationGate<'_>,
    ) -> Result<bool, SyncError> {
        let tag = self.tag.name();
        loop {
            match gate.ask(stage, &tag).await {
                Verdict::Proceed => return Ok(true),
                Verdict::Reject => return Ok(false),
                Verdict::Retry => {
                    tracing::debug!("Retrying {} of {}", stage, tag);
                    self.driver.dispatch(function, &self.args).await?;
                }
            }
        }
    }
}

impl<'a> SyncRun<'a, Idle> {
    /// Persist the deploy record.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::DeployFile` if the record cannot be written.
    #[must_use = "sync phase must be used"]
    pub async fn write_deploy_file(self) -> Result<SyncRun<'a, DeployFileWritten>, SyncError> {
        let record = DeployRecord::new(self.tag, &self.driver.user);
        record.write(&self.driver.record_path).await?;
        tracing::debug!("Wrote deploy record {}", self.driver.record_path.display());
        Ok(self.transition(DeployFileWritten))
    }
}

impl<'a> SyncRun<'a, DeployFileWritten> {
    /// Make the repository discoverable by the fleet.
    ///
    /// Never fails: every problem, including per-submodule ones, becomes a warning.
    pub async fn publish_server_info(mut self) -> SyncRun<'a, ServerInfoPublished> {
        let vcs = &self.driver.vcs;
        if let Err(e) = vcs.update_server_info().await {
            self.diagnostics
                .warn(Warning::server_info(format!("update-server-info failed: {e}")));
        }

        if self.driver.checkout_submodules {
            let name = self.tag.name();
            match vcs.submodule_paths().await {
                Ok(paths) => {
                    for path in paths {
                        let submodule = vcs.submodule(&path);
                        if let Err(e) = submodule.create_tag(&name).await {
                            self.diagnostics.warn(Warning::submodule_publish(format!(
                                "failed to tag {} in {}: {e}",
                                name,
                                path.display()
                            )));
                        }
                        if let Err(e) = submodule.update_server_info().await {
                            self.diagnostics.warn(Warning::submodule_publish(format!(
                                "update-server-info failed in {}: {e}",
                                path.display()
                            )));
                        }
                    }
                }
                Err(e) => self.diagnostics.warn(Warning::submodule_publish(format!(
                    "failed to list submodules: {e}"
                ))),
            }
        }

        self.transition(ServerInfoPublished)
    }
}

impl<'a> SyncRun<'a, ServerInfoPublished> {
    /// Ask every node to fetch the published ref. Returns once dispatched.
    #[must_use = "sync phase must be used"]
    pub async fn trigger_fetch(self) -> Result<SyncRun<'a, Fetching>, SyncError> {
        self.driver.dispatch(FleetFunction::Fetch, &self.args).await?;
        Ok(self.transition(Fetching))
    }
}

impl<'a> SyncRun<'a, Fetching> {
    /// # Errors
    ///
    /// Returns `SyncError::FetchRejected` if the operator answers no.
    #[must_use = "sync phase must be used"]
    pub async fn confirm(
        self,
        gate: &ConfirmationGate<'_>,
    ) -> Result<SyncRun<'a, FetchConfirmed>, SyncError> {
        if !self
            .confirm_stage(Stage::Fetch, FleetFunction::Fetch, gate)
            .await?
        {
            return Err(SyncError::FetchRejected {
                tag: self.tag.name(),
            });
        }
        Ok(self.transition(FetchConfirmed))
    }
}

impl<'a> SyncRun<'a, FetchConfirmed> {
    /// Ask every node to check out the fetched tag. Returns once dispatched.
    #[must_use = "sync phase must be used"]
    pub async fn trigger_checkout(self) -> Result<SyncRun<'a, CheckingOut>, SyncError> {
        self.driver
            .dispatch(FleetFunction::Checkout, &self.args)
            .await?;
        Ok(self.transition(CheckingOut))
    }
}

impl<'a> SyncRun<'a, CheckingOut> {
    /// # Errors
    ///
    /// Returns `SyncError::CheckoutRejected` if the operator answers no.
    #[must_use = "sync phase must be used"]
    pub async fn confirm(self, gate: &ConfirmationGate<'_>) -> Result<SyncRun<'a, Done>, SyncError> {
        if !self
            .confirm_stage(Stage::Checkout, FleetFunction::Checkout, gate)
            .await?
        {
            return Err(SyncError::CheckoutRejected {
                tag: self.tag.name(),
            });
        }
        Ok(self.transition(Done))
    }
}

impl SyncRun<'_, Done> {
    pub fn finish(self) -> Diagnostics {
        self.diagnostics
    }
}

#[async_trait]
impl SyncDriver for LocalSyncDriver {
    async fn sync(
        &self,
        tag: &DeployTag,
        args: &SyncArgs,
        gate: &ConfirmationGate<'_>,
    ) -> Result<Diagnostics, SyncError> {
        let run = self
            .begin(tag, *args)
            .write_deploy_file()
            .await?
            .publish_server_info()
            .await
            .trigger_fetch()
            .await?
            .confirm(gate)
            .await?
            .trigger_checkout()
            .await?
            .confirm(gate)
            .await?;
        Ok(run.finish())
    }

    async fn deploy_info(&self) -> Result<DeployRecord, SyncError> {
        DeployRecord::read(&self.record_path).await
    }
}
