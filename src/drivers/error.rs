// ABOUTME: Error types for the four driver capabilities.
// ABOUTME: SyncError carries a stable numeric code the orchestrator folds into its exit code.

use std::path::PathBuf;
use thiserror::Error;

use crate::dispatch::{DispatchError, FleetFunction};
use crate::fleet::StoreError;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("failed to create lock directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write lock file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("lock file {} already exists", path.display())]
    AlreadyHeld { path: PathBuf },

    #[error("lock file {} does not exist", path.display())]
    Missing { path: PathBuf },

    #[error("failed to remove lock file {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to write deploy file {}: {source}", path.display())]
    DeployFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("fetch of {tag} was not confirmed")]
    FetchRejected { tag: String },

    #[error("checkout of {tag} was not confirmed")]
    CheckoutRejected { tag: String },

    #[error("failed to dispatch {function}: {source}")]
    Dispatch {
        function: FleetFunction,
        #[source]
        source: DispatchError,
    },

    #[error("no deploy record at {}; nothing has been synced yet", path.display())]
    NeverSynced { path: PathBuf },

    #[error("deploy record {} is corrupt: {reason}", path.display())]
    CorruptRecord { path: PathBuf, reason: String },
}

impl SyncError {
    /// Stable per-site code, offset by the orchestrator into its exit code range.
    pub fn code(&self) -> i32 {
        match self {
            SyncError::DeployFile { .. } => 1,
            SyncError::FetchRejected { .. } => 2,
            SyncError::CheckoutRejected { .. } => 3,
            SyncError::Dispatch { .. } => 4,
            SyncError::NeverSynced { .. } => 5,
            SyncError::CorruptRecord { .. } => 6,
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{action} is not implemented by this driver")]
    NotImplemented { action: &'static str },

    #[error("malformed service reply: {0}")]
    MalformedReply(String),

    #[error("service dispatch reported an error: {0}")]
    DispatchFailed(String),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Store(#[from] StoreError),
}
