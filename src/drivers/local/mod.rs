// ABOUTME: The built-in "local" driver family.
// ABOUTME: File lock and deploy record under <git-dir>/deploy, salt dispatch, store-backed reports.

mod lock;
pub mod phase;
mod record;
mod report;
mod service;
mod sync;

pub use lock::{FileLockDriver, LOCK_FILE};
pub use record::{DEPLOY_FILE, DeployRecord};
pub use report::StoreReportDriver;
pub use service::{SaltServiceDriver, parse_restart_reply};
pub use sync::{LocalSyncDriver, SyncRun};

use std::path::{Path, PathBuf};

/// Directory holding the lock file and the deploy record.
pub fn deploy_dir(git_dir: &Path) -> PathBuf {
    git_dir.join("deploy")
}
