// ABOUTME: Capability traits the orchestrator dispatches through: lock, sync, service, report.
// ABOUTME: Implementations are chosen once from configuration via the driver registry.

mod error;
pub mod local;
mod lock_info;
mod registry;

pub use error::{LockError, ReportError, ServiceError, SyncError};
pub use local::DeployRecord;
pub use lock_info::LockInfo;
pub use registry::{DriverContext, DriverRegistry, DriverRole, Drivers};

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

use crate::confirm::ConfirmationGate;
use crate::diagnostics::Diagnostics;
use crate::fleet::{FleetReport, SyncScope};
use crate::types::{BatchSpec, DeployTag};

/// Local deployment-lock state for one control repository clone.
#[async_trait]
pub trait LockDriver: Send + Sync {
    /// The current lock, `None` when no deployment is in progress.
    ///
    /// Unreadable or corrupt lock files yield a lock with unknown holder.
    async fn check_lock(&self) -> Option<LockInfo>;

    async fn add_lock(&self, holder: &str) -> Result<(), LockError>;

    async fn remove_lock(&self) -> Result<(), LockError>;
}

/// Options for a sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncArgs {
    /// Ask nodes to check out even over local modifications.
    pub force: bool,
}

/// Drives the fetch and checkout phases on the fleet.
#[async_trait]
pub trait SyncDriver: Send + Sync {
    /// Publish `tag` and walk the fleet through fetch and checkout,
    /// asking `gate` before trusting each stage.
    ///
    /// Partial failures that do not stop the sync are returned as diagnostics.
    async fn sync(
        &self,
        tag: &DeployTag,
        args: &SyncArgs,
        gate: &ConfirmationGate<'_>,
    ) -> Result<Diagnostics, SyncError>;

    /// The record written by the last successful sync.
    async fn deploy_info(&self) -> Result<DeployRecord, SyncError>;
}

/// Fleet-wide service lifecycle action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Start,
    Stop,
    Restart,
    Reload,
}

impl ServiceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
            ServiceAction::Restart => "restart",
            ServiceAction::Reload => "reload",
        }
    }
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(ServiceAction::Start),
            "stop" => Ok(ServiceAction::Stop),
            "restart" => Ok(ServiceAction::Restart),
            "reload" => Ok(ServiceAction::Reload),
            other => Err(other.to_string()),
        }
    }
}

/// Per-node outcome of a service action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceReport {
    pub nodes: Vec<(String, String)>,
}

impl ServiceReport {
    pub fn lines(&self) -> Vec<String> {
        self.nodes
            .iter()
            .map(|(node, status)| format!("{node}: {status}"))
            .collect()
    }
}

/// Triggers service lifecycle actions on the fleet.
///
/// Every action defaults to "not implemented"; drivers override what they support.
#[async_trait]
pub trait ServiceDriver: Send + Sync {
    async fn start(&self, _batch: Option<BatchSpec>) -> Result<ServiceReport, ServiceError> {
        Err(ServiceError::NotImplemented { action: "start" })
    }

    async fn stop(&self, _batch: Option<BatchSpec>) -> Result<ServiceReport, ServiceError> {
        Err(ServiceError::NotImplemented { action: "stop" })
    }

    async fn restart(&self, _batch: Option<BatchSpec>) -> Result<ServiceReport, ServiceError> {
        Err(ServiceError::NotImplemented { action: "restart" })
    }

    async fn reload(&self, _batch: Option<BatchSpec>) -> Result<ServiceReport, ServiceError> {
        Err(ServiceError::NotImplemented { action: "reload" })
    }
}

/// Aggregates fleet status into human-readable progress.
#[async_trait]
pub trait ReportDriver: Send + Sync {
    async fn report_sync(
        &self,
        tag: &str,
        scope: SyncScope,
        detailed: bool,
    ) -> Result<FleetReport, ReportError>;

    async fn report_service(&self, detailed: bool) -> Result<FleetReport, ReportError>;
}
