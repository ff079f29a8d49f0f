// ABOUTME: Explicit registry from driver role and name to constructor function.
// ABOUTME: Drivers are selected once from configuration and injected into the orchestrator.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use super::local::{
    DEPLOY_FILE, FileLockDriver, LocalSyncDriver, SaltServiceDriver, StoreReportDriver,
    deploy_dir,
};
use super::{LockDriver, ReportDriver, ServiceDriver, SyncDriver};
use crate::config::{Config, ConfigurationError, keys};
use crate::dispatch::CommandDispatcher;
use crate::fleet::RedisStatusStore;
use crate::git::Vcs;
use crate::types::RepoName;

/// The four pluggable capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverRole {
    Lock,
    Sync,
    Service,
    Report,
}

impl DriverRole {
    pub const ALL: [DriverRole; 4] = [
        DriverRole::Lock,
        DriverRole::Sync,
        DriverRole::Service,
        DriverRole::Report,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DriverRole::Lock => "lock",
            DriverRole::Sync => "sync",
            DriverRole::Service => "service",
            DriverRole::Report => "report",
        }
    }

    /// Configuration key naming the driver for this role.
    pub fn config_key(&self) -> &'static str {
        match self {
            DriverRole::Lock => keys::LOCK_DRIVER,
            DriverRole::Sync => keys::SYNC_DRIVER,
            DriverRole::Service => keys::SERVICE_DRIVER,
            DriverRole::Report => keys::REPORT_DRIVER,
        }
    }
}

impl fmt::Display for DriverRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a driver constructor may draw on.
pub struct DriverContext {
    pub config: Arc<Config>,
    pub repo: RepoName,
    pub user: String,
    pub git_dir: PathBuf,
    pub vcs: Arc<dyn Vcs>,
    pub dispatcher: Arc<dyn CommandDispatcher>,
}

/// One selected driver per role.
pub struct Drivers {
    pub lock: Box<dyn LockDriver>,
    pub sync: Box<dyn SyncDriver>,
    pub service: Box<dyn ServiceDriver>,
    pub report: Box<dyn ReportDriver>,
}

pub type LockConstructor = fn(&DriverContext) -> Result<Box<dyn LockDriver>, ConfigurationError>;
pub type SyncConstructor = fn(&DriverContext) -> Result<Box<dyn SyncDriver>, ConfigurationError>;
pub type ServiceConstructor =
    fn(&DriverContext) -> Result<Box<dyn ServiceDriver>, ConfigurationError>;
pub type ReportConstructor =
    fn(&DriverContext) -> Result<Box<dyn ReportDriver>, ConfigurationError>;

#[derive(Default)]
pub struct DriverRegistry {
    lock: HashMap<String, LockConstructor>,
    sync: HashMap<String, SyncConstructor>,
    service: HashMap<String, ServiceConstructor>,
    report: HashMap<String, ReportConstructor>,
}

impl DriverRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with the built-in `local` family for every role.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register_lock(keys::DEFAULT_DRIVER, local_lock);
        registry.register_sync(keys::DEFAULT_DRIVER, local_sync);
        registry.register_service(keys::DEFAULT_DRIVER, local_service);
        registry.register_report(keys::DEFAULT_DRIVER, local_report);
        registry
    }

    pub fn register_lock(&mut self, name: &str, constructor: LockConstructor) {
        self.lock.insert(name.to_string(), constructor);
    }

    pub fn register_sync(&mut self, name: &str, constructor: SyncConstructor) {
        self.sync.insert(name.to_string(), constructor);
    }

    pub fn register_service(&mut self, name: &str, constructor: ServiceConstructor) {
        self.service.insert(name.to_string(), constructor);
    }

    pub fn register_report(&mut self, name: &str, constructor: ReportConstructor) {
        self.report.insert(name.to_string(), constructor);
    }

    /// Construct the driver configured for each role.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::UnknownDriver` when a role names a driver
    /// that is not registered, or whatever the constructor reports.
    pub fn load(&self, ctx: &DriverContext) -> Result<Drivers, ConfigurationError> {
        let lock = lookup(&self.lock, DriverRole::Lock, &ctx.config)?;
        let sync = lookup(&self.sync, DriverRole::Sync, &ctx.config)?;
        let service = lookup(&self.service, DriverRole::Service, &ctx.config)?;
        let report = lookup(&self.report, DriverRole::Report, &ctx.config)?;

        Ok(Drivers {
            lock: lock(ctx)?,
            sync: sync(ctx)?,
            service: service(ctx)?,
            report: report(ctx)?,
        })
    }
}

fn lookup<C: Copy>(
    constructors: &HashMap<String, C>,
    role: DriverRole,
    config: &Config,
) -> Result<C, ConfigurationError> {
    let name = config.driver(role.config_key());
    tracing::debug!("Using {} driver {}", role, name);
    constructors
        .get(name)
        .copied()
        .ok_or_else(|| ConfigurationError::UnknownDriver {
            role: role.as_str(),
            name: name.to_string(),
        })
}

fn local_lock(ctx: &DriverContext) -> Result<Box<dyn LockDriver>, ConfigurationError> {
    Ok(Box::new(FileLockDriver::new(&ctx.git_dir)))
}

fn local_sync(ctx: &DriverContext) -> Result<Box<dyn SyncDriver>, ConfigurationError> {
    let driver = LocalSyncDriver::new(
        ctx.repo.clone(),
        ctx.user.clone(),
        ctx.vcs.clone(),
        ctx.dispatcher.clone(),
        deploy_dir(&ctx.git_dir).join(DEPLOY_FILE),
    )
    .with_submodules(ctx.config.checkout_submodules()?);
    Ok(Box::new(driver))
}

fn local_service(ctx: &DriverContext) -> Result<Box<dyn ServiceDriver>, ConfigurationError> {
    Ok(Box::new(SaltServiceDriver::new(
        ctx.repo.clone(),
        ctx.dispatcher.clone(),
    )))
}

fn local_report(ctx: &DriverContext) -> Result<Box<dyn ReportDriver>, ConfigurationError> {
    let store = RedisStatusStore::new(ctx.config.status_store_url()).map_err(|e| {
        ConfigurationError::DriverLoad {
            role: DriverRole::Report.as_str(),
            reason: e.to_string(),
        }
    })?;
    Ok(Box::new(StoreReportDriver::new(
        ctx.repo.clone(),
        Arc::new(store),
    )))
}
