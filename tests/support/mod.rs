// ABOUTME: Test support utilities.
// ABOUTME: Provides in-memory collaborators and an orchestrator harness for integration tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use tempfile::TempDir;

use trigger::confirm::{Answer, ScriptedConfirmation};
use trigger::deploy::Orchestrator;
use trigger::dispatch::{CommandDispatcher, DispatchError, FleetFunction};
use trigger::drivers::local::{
    DEPLOY_FILE, FileLockDriver, LOCK_FILE, LocalSyncDriver, SaltServiceDriver,
    StoreReportDriver, deploy_dir,
};
use trigger::drivers::Drivers;
use trigger::fleet::MemoryStatusStore;
use trigger::git::{Vcs, VcsError};
use trigger::output::{Output, OutputMode};
use trigger::types::RepoName;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("trigger=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Observable state of the fake repository.
#[derive(Debug, Default)]
pub struct FakeRepo {
    pub tags: Vec<String>,
    pub head: Option<String>,
    pub dirty: bool,
    pub fail_tag: bool,
    pub fail_reset: bool,
    pub fail_status: bool,
    pub resets: Vec<String>,
    pub server_info_updates: usize,
    pub submodules: Vec<PathBuf>,
    pub failing_submodules: Vec<PathBuf>,
    pub submodule_tags: Vec<(PathBuf, String)>,
    pub submodule_server_info: Vec<PathBuf>,
}

fn failed(command: &str) -> VcsError {
    VcsError::CommandFailed {
        command: command.to_string(),
        stderr: "simulated failure".to_string(),
    }
}

/// In-memory version control with switchable failures.
#[derive(Clone)]
pub struct FakeVcs {
    pub repo: Arc<Mutex<FakeRepo>>,
}

impl FakeVcs {
    pub fn new() -> Self {
        let repo = FakeRepo {
            head: Some("0f1e2d3c".to_string()),
            ..Default::default()
        };
        Self {
            repo: Arc::new(Mutex::new(repo)),
        }
    }
}

#[async_trait]
impl Vcs for FakeVcs {
    async fn create_tag(&self, name: &str) -> Result<(), VcsError> {
        let mut repo = self.repo.lock();
        if repo.fail_tag || repo.head.is_none() {
            return Err(failed("tag"));
        }
        repo.tags.push(name.to_string());
        Ok(())
    }

    async fn is_dirty(&self) -> Result<bool, VcsError> {
        let repo = self.repo.lock();
        if repo.fail_status {
            return Err(failed("status"));
        }
        Ok(repo.dirty)
    }

    async fn reset_to(&self, tag: &str) -> Result<(), VcsError> {
        let mut repo = self.repo.lock();
        repo.resets.push(tag.to_string());
        if repo.fail_reset {
            return Err(failed("reset"));
        }
        Ok(())
    }

    async fn list_tags(&self) -> Result<Vec<String>, VcsError> {
        Ok(self.repo.lock().tags.clone())
    }

    async fn current_head(&self) -> Result<Option<String>, VcsError> {
        Ok(self.repo.lock().head.clone())
    }

    async fn update_server_info(&self) -> Result<(), VcsError> {
        self.repo.lock().server_info_updates += 1;
        Ok(())
    }

    async fn submodule_paths(&self) -> Result<Vec<PathBuf>, VcsError> {
        Ok(self.repo.lock().submodules.clone())
    }

    fn submodule(&self, path: &Path) -> Box<dyn Vcs> {
        Box::new(FakeSubmodule {
            repo: self.repo.clone(),
            path: path.to_path_buf(),
        })
    }
}

/// A submodule of [`FakeVcs`]; records into the parent's state.
struct FakeSubmodule {
    repo: Arc<Mutex<FakeRepo>>,
    path: PathBuf,
}

impl FakeSubmodule {
    fn check(&self, command: &str) -> Result<(), VcsError> {
        if self.repo.lock().failing_submodules.contains(&self.path) {
            return Err(failed(command));
        }
        Ok(())
    }
}

#[async_trait]
impl Vcs for FakeSubmodule {
    async fn create_tag(&self, name: &str) -> Result<(), VcsError> {
        self.check("tag")?;
        self.repo
            .lock()
            .submodule_tags
            .push((self.path.clone(), name.to_string()));
        Ok(())
    }

    async fn is_dirty(&self) -> Result<bool, VcsError> {
        Ok(false)
    }

    async fn reset_to(&self, _tag: &str) -> Result<(), VcsError> {
        Ok(())
    }

    async fn list_tags(&self) -> Result<Vec<String>, VcsError> {
        Ok(Vec::new())
    }

    async fn current_head(&self) -> Result<Option<String>, VcsError> {
        Ok(None)
    }

    async fn update_server_info(&self) -> Result<(), VcsError> {
        self.check("update-server-info")?;
        self.repo
            .lock()
            .submodule_server_info
            .push(self.path.clone());
        Ok(())
    }

    async fn submodule_paths(&self) -> Result<Vec<PathBuf>, VcsError> {
        Ok(Vec::new())
    }

    fn submodule(&self, path: &Path) -> Box<dyn Vcs> {
        Box::new(FakeSubmodule {
            repo: self.repo.clone(),
            path: path.to_path_buf(),
        })
    }
}

/// Records every dispatched fleet command and answers with a canned reply.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub calls: Mutex<Vec<(FleetFunction, String)>>,
    pub reply: Mutex<String>,
    pub fail: Mutex<bool>,
}

#[allow(dead_code)]
impl RecordingDispatcher {
    pub fn calls(&self) -> Vec<(FleetFunction, String)> {
        self.calls.lock().clone()
    }

    pub fn functions(&self) -> Vec<FleetFunction> {
        self.calls.lock().iter().map(|(f, _)| *f).collect()
    }

    pub fn reply_with(&self, reply: &str) {
        *self.reply.lock() = reply.to_string();
    }

    pub fn fail(&self) {
        *self.fail.lock() = true;
    }
}

#[async_trait]
impl CommandDispatcher for RecordingDispatcher {
    async fn dispatch(
        &self,
        function: FleetFunction,
        argument: &str,
    ) -> Result<String, DispatchError> {
        self.calls.lock().push((function, argument.to_string()));
        if *self.fail.lock() {
            return Err(DispatchError::Failed {
                function,
                status: "exit status: 1".to_string(),
                stderr: "no master".to_string(),
            });
        }
        Ok(self.reply.lock().clone())
    }
}

/// A control repository with fake collaborators and real local drivers.
pub struct Harness {
    pub git_dir: TempDir,
    pub repo: RepoName,
    pub vcs: FakeVcs,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub store: Arc<MemoryStatusStore>,
    pub prompt: Arc<ScriptedConfirmation>,
    pub checkout_submodules: bool,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        Self::with_answers(Vec::new())
    }

    pub fn with_answers(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            git_dir: TempDir::new().unwrap(),
            repo: RepoName::new("web").unwrap(),
            vcs: FakeVcs::new(),
            dispatcher: Arc::new(RecordingDispatcher::default()),
            store: Arc::new(MemoryStatusStore::new()),
            prompt: Arc::new(ScriptedConfirmation::new(answers)),
            checkout_submodules: false,
        }
    }

    pub fn lock_path(&self) -> PathBuf {
        deploy_dir(self.git_dir.path()).join(LOCK_FILE)
    }

    pub fn record_path(&self) -> PathBuf {
        deploy_dir(self.git_dir.path()).join(DEPLOY_FILE)
    }

    pub fn lock_driver(&self) -> FileLockDriver {
        FileLockDriver::new(self.git_dir.path())
    }

    pub fn sync_driver(&self, user: &str) -> LocalSyncDriver {
        LocalSyncDriver::new(
            self.repo.clone(),
            user,
            Arc::new(self.vcs.clone()),
            self.dispatcher.clone(),
            self.record_path(),
        )
        .with_submodules(self.checkout_submodules)
    }

    pub fn report_driver(&self) -> StoreReportDriver {
        StoreReportDriver::new(self.repo.clone(), self.store.clone())
    }

    /// Orchestrator acting as `user`.
    pub fn orchestrator(&self, user: &str) -> Orchestrator {
        let drivers = Drivers {
            lock: Box::new(self.lock_driver()),
            sync: Box::new(self.sync_driver(user)),
            service: Box::new(SaltServiceDriver::new(
                self.repo.clone(),
                self.dispatcher.clone(),
            )),
            report: Box::new(self.report_driver()),
        };
        Orchestrator::new(
            self.repo.clone(),
            user,
            Arc::new(self.vcs.clone()),
            drivers,
            self.prompt.clone(),
            Output::new(OutputMode::Quiet),
        )
    }

    pub fn tags(&self) -> Vec<String> {
        self.vcs.repo.lock().tags.clone()
    }
}
