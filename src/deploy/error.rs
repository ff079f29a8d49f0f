// ABOUTME: Orchestrator error type with SNAFU context selectors, one variant per failure site.
// ABOUTME: Each variant maps to a stable exit code and a coarse kind for programmatic handling.

use snafu::Snafu;

use crate::drivers::{LockError, ReportError, ServiceError, SyncError};
use crate::git::VcsError;

/// Failure of one orchestrator operation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum OrchestratorError {
    #[snafu(display("deployment already started by {holder}"))]
    AlreadyStarted { holder: String },

    #[snafu(display("failed to acquire the deployment lock: {source}"))]
    StartLock { source: LockError },

    #[snafu(display("failed to write start tag {tag}: {source}"))]
    StartTag { tag: String, source: VcsError },

    #[snafu(display(
        "failed to write start tag {tag}: the repository has no commits; \
         create an initial commit before starting a deployment"
    ))]
    EmptyRepository { tag: String },

    #[snafu(display("there is no deployment to abort"))]
    NothingToAbort,

    #[snafu(display("failed to release the deployment lock: {source}"))]
    AbortRelease { source: LockError },

    #[snafu(display("deployment is locked by {holder}; use --force to abort it anyway"))]
    LockedByOther { holder: String },

    #[snafu(display("deployment not started; run start first"))]
    SyncNotStarted,

    #[snafu(display("the working tree has uncommitted changes; commit or stash them before syncing"))]
    DirtyTree,

    #[snafu(display("failed to inspect the working tree: {source}"))]
    TreeInspect { source: VcsError },

    #[snafu(display("sync failed: {source}"))]
    SyncFailed { source: SyncError },

    #[snafu(display("failed to write sync tag {tag}: {source}"))]
    SyncTag { tag: String, source: VcsError },

    #[snafu(display("sync succeeded but the deployment lock could not be released: {source}"))]
    SyncRelease { source: LockError },

    #[snafu(display("deployment not started; nothing to finish"))]
    FinishNotStarted,

    #[snafu(display("failed to release the deployment lock: {source}"))]
    FinishRelease { source: LockError },

    #[snafu(display("unknown service action '{action}', expected stop, start, restart or reload"))]
    UnknownAction { action: String },

    #[snafu(display("service {action} failed: {source}"))]
    ServiceFailed {
        action: &'static str,
        source: ServiceError,
    },

    #[snafu(display("no deploy information available: {source}"))]
    NoDeployRecord { source: SyncError },

    #[snafu(display("failed to read fleet status: {source}"))]
    ReportRead { source: ReportError },
}

/// Coarse category of an orchestrator failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorErrorKind {
    /// The requested operation is not legal in the current deployment state.
    InvalidState,
    /// The operator asked for something that does not exist.
    Usage,
    /// Lock file could not be created or removed.
    Lock,
    /// A version-control command failed.
    Vcs,
    /// The sync driver failed or was rejected.
    Sync,
    /// The service driver failed.
    Service,
    /// Fleet status or deploy record could not be read.
    Report,
}

impl OrchestratorError {
    /// Process exit code for this failure site.
    pub fn code(&self) -> i32 {
        match self {
            OrchestratorError::AlreadyStarted { .. } => 100,
            OrchestratorError::StartLock { .. } => 101,
            OrchestratorError::StartTag { .. } => 102,
            OrchestratorError::EmptyRepository { .. } => 103,
            OrchestratorError::NothingToAbort => 130,
            OrchestratorError::AbortRelease { .. } => 131,
            OrchestratorError::LockedByOther { .. } => 132,
            OrchestratorError::SyncNotStarted => 160,
            OrchestratorError::DirtyTree => 161,
            OrchestratorError::TreeInspect { .. } => 162,
            OrchestratorError::SyncFailed { source } => 162 + source.code(),
            OrchestratorError::SyncTag { .. } => 169,
            OrchestratorError::SyncRelease { .. } => 170,
            OrchestratorError::FinishNotStarted => 180,
            OrchestratorError::FinishRelease { .. } => 181,
            OrchestratorError::UnknownAction { .. } => 200,
            OrchestratorError::ServiceFailed {
                source: ServiceError::NotImplemented { .. },
                ..
            } => 201,
            OrchestratorError::ServiceFailed { .. } => 202,
            OrchestratorError::NoDeployRecord { .. } => 210,
            OrchestratorError::ReportRead { .. } => 211,
        }
    }

    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> OrchestratorErrorKind {
        match self {
            OrchestratorError::AlreadyStarted { .. }
            | OrchestratorError::EmptyRepository { .. }
            | OrchestratorError::NothingToAbort
            | OrchestratorError::LockedByOther { .. }
            | OrchestratorError::SyncNotStarted
            | OrchestratorError::DirtyTree
            | OrchestratorError::FinishNotStarted => OrchestratorErrorKind::InvalidState,
            OrchestratorError::UnknownAction { .. } => OrchestratorErrorKind::Usage,
            OrchestratorError::StartLock { .. }
            | OrchestratorError::AbortRelease { .. }
            | OrchestratorError::SyncRelease { .. }
            | OrchestratorError::FinishRelease { .. } => OrchestratorErrorKind::Lock,
            OrchestratorError::StartTag { .. }
            | OrchestratorError::TreeInspect { .. }
            | OrchestratorError::SyncTag { .. } => OrchestratorErrorKind::Vcs,
            OrchestratorError::SyncFailed { .. } => OrchestratorErrorKind::Sync,
            OrchestratorError::ServiceFailed { .. } => OrchestratorErrorKind::Service,
            OrchestratorError::NoDeployRecord { .. } | OrchestratorError::ReportRead { .. } => {
                OrchestratorErrorKind::Report
            }
        }
    }
}
