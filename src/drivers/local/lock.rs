// ABOUTME: Deploy lock kept as a JSON file under <git-dir>/deploy/lock.
// ABOUTME: Uses create-new semantics so an existing lock is never overwritten.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::OnceCell;

use super::deploy_dir;
use crate::drivers::{LockDriver, LockError, LockInfo};

pub const LOCK_FILE: &str = "lock";

/// File-backed lock for one control repository clone.
///
/// The lock is advisory: it serializes deployments started from this clone
/// and says nothing about other clones or the fleet.
#[derive(Debug)]
pub struct FileLockDriver {
    dir: PathBuf,
    path: PathBuf,
    dir_ready: OnceCell<()>,
}

impl FileLockDriver {
    pub fn new(git_dir: &Path) -> Self {
        let dir = deploy_dir(git_dir);
        let path = dir.join(LOCK_FILE);
        Self {
            dir,
            path,
            dir_ready: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the deploy directory the first time a lock is written.
    async fn ensure_dir(&self) -> Result<(), LockError> {
        self.dir_ready
            .get_or_try_init(|| async {
                tokio::fs::create_dir_all(&self.dir)
                    .await
                    .map_err(|source| LockError::CreateDir {
                        path: self.dir.clone(),
                        source,
                    })
            })
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl LockDriver for FileLockDriver {
    async fn check_lock(&self) -> Option<LockInfo> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Some(LockInfo::from_json(&content)),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("Failed to read lock file {}: {}", self.path.display(), e);
                Some(LockInfo::default())
            }
        }
    }

    async fn add_lock(&self, holder: &str) -> Result<(), LockError> {
        self.ensure_dir().await?;

        let write_error = |source: std::io::Error| LockError::Write {
            path: self.path.clone(),
            source,
        };
        let json = LockInfo::new(holder)
            .to_json()
            .map_err(|e| write_error(std::io::Error::other(e)))?;

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => LockError::AlreadyHeld {
                    path: self.path.clone(),
                },
                _ => write_error(e),
            })?;
        file.write_all(json.as_bytes()).await.map_err(write_error)?;
        file.flush().await.map_err(write_error)?;

        tracing::debug!("Wrote lock file {} for {}", self.path.display(), holder);
        Ok(())
    }

    async fn remove_lock(&self) -> Result<(), LockError> {
        tokio::fs::remove_file(&self.path)
            .await
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => LockError::Missing {
                    path: self.path.clone(),
                },
                _ => LockError::Remove {
                    path: self.path.clone(),
                    source,
                },
            })?;
        tracing::debug!("Removed lock file {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn lock_lifecycle() {
        let git_dir = TempDir::new().unwrap();
        let driver = FileLockDriver::new(git_dir.path());

        assert!(driver.check_lock().await.is_none());
        driver.add_lock("alice").await.unwrap();
        assert!(driver.path().exists());

        let info = driver.check_lock().await.unwrap();
        assert!(info.is_held_by("alice"));

        driver.remove_lock().await.unwrap();
        assert!(driver.check_lock().await.is_none());
    }

    #[tokio::test]
    async fn second_add_does_not_overwrite() {
        let git_dir = TempDir::new().unwrap();
        let driver = FileLockDriver::new(git_dir.path());

        driver.add_lock("alice").await.unwrap();
        let err = driver.add_lock("bob").await.unwrap_err();
        assert!(matches!(err, LockError::AlreadyHeld { .. }));
        assert!(driver.check_lock().await.unwrap().is_held_by("alice"));
    }

    #[tokio::test]
    async fn removing_missing_lock_fails() {
        let git_dir = TempDir::new().unwrap();
        let driver = FileLockDriver::new(git_dir.path());
        assert!(matches!(
            driver.remove_lock().await,
            Err(LockError::Missing { .. })
        ));
    }

    #[tokio::test]
    async fn corrupt_lock_reads_as_unknown_holder() {
        let git_dir = TempDir::new().unwrap();
        let driver = FileLockDriver::new(git_dir.path());
        std::fs::create_dir_all(git_dir.path().join("deploy")).unwrap();
        std::fs::write(driver.path(), "{{{").unwrap();

        let info = driver.check_lock().await.unwrap();
        assert!(info.is_unknown());
    }

    #[tokio::test]
    async fn unwritable_directory_is_a_lock_error() {
        let git_dir = TempDir::new().unwrap();
        // A regular file where the deploy directory should be.
        std::fs::write(git_dir.path().join("deploy"), "").unwrap();
        let driver = FileLockDriver::new(git_dir.path());

        assert!(matches!(
            driver.add_lock("alice").await,
            Err(LockError::CreateDir { .. })
        ));
    }
}
