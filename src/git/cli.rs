// ABOUTME: Vcs implementation that shells out to the git binary.
// ABOUTME: Also exposes repository discovery and config listing used at startup.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;

use super::{Vcs, VcsError};
use crate::config::LayerLevel;

#[derive(Debug, Clone)]
pub struct GitCli {
    work_tree: PathBuf,
}

impl GitCli {
    pub fn new(work_tree: impl Into<PathBuf>) -> Self {
        Self {
            work_tree: work_tree.into(),
        }
    }

    /// Find the work tree containing `dir`.
    pub async fn discover(dir: &Path) -> Result<Self, VcsError> {
        let probe = Self::new(dir);
        let top = probe.run_checked(&["rev-parse", "--show-toplevel"]).await?;
        Ok(Self::new(top.trim()))
    }

    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    /// Absolute path of the repository's git directory.
    pub async fn git_dir(&self) -> Result<PathBuf, VcsError> {
        let dir = self
            .run_checked(&["rev-parse", "--absolute-git-dir"])
            .await?;
        Ok(PathBuf::from(dir.trim()))
    }

    /// `git config --list` for one scope. A scope without a config file
    /// yields an empty listing rather than an error.
    pub async fn config_list(&self, level: LayerLevel) -> Result<String, VcsError> {
        let Some(scope) = level.git_scope() else {
            return Ok(String::new());
        };
        let output = self.run(&["config", scope, "--list"]).await?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            tracing::debug!(
                "No {} git config: {}",
                level,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            Ok(String::new())
        }
    }

    async fn run(&self, args: &[&str]) -> Result<Output, VcsError> {
        tracing::debug!(args = ?args, dir = %self.work_tree.display(), "Running git command");

        Command::new("git")
            .args(args)
            .current_dir(&self.work_tree)
            .output()
            .await
            .map_err(|source| VcsError::Spawn {
                command: args.join(" "),
                source,
            })
    }

    async fn run_checked(&self, args: &[&str]) -> Result<String, VcsError> {
        let output = self.run(args).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(args = ?args, stderr = %stderr, "Git command failed");
            return Err(VcsError::CommandFailed {
                command: args.join(" "),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Vcs for GitCli {
    async fn create_tag(&self, name: &str) -> Result<(), VcsError> {
        self.run_checked(&["tag", name]).await?;
        Ok(())
    }

    async fn is_dirty(&self) -> Result<bool, VcsError> {
        let status = self
            .run_checked(&["status", "--porcelain", "--untracked-files=no"])
            .await?;
        Ok(!status.trim().is_empty())
    }

    async fn reset_to(&self, tag: &str) -> Result<(), VcsError> {
        let commit = format!("{tag}^{{commit}}");
        self.run_checked(&["reset", "--hard", &commit]).await?;
        Ok(())
    }

    async fn list_tags(&self) -> Result<Vec<String>, VcsError> {
        let tags = self.run_checked(&["tag", "--list"]).await?;
        Ok(tags
            .lines()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn current_head(&self) -> Result<Option<String>, VcsError> {
        let output = self
            .run(&["rev-parse", "--verify", "--quiet", "HEAD"])
            .await?;
        if output.status.success() {
            let head = String::from_utf8_lossy(&output.stdout).trim().to_string();
            Ok(Some(head))
        } else {
            Ok(None)
        }
    }

    async fn update_server_info(&self) -> Result<(), VcsError> {
        self.run_checked(&["update-server-info"]).await?;
        Ok(())
    }

    async fn submodule_paths(&self) -> Result<Vec<PathBuf>, VcsError> {
        let listing = self
            .run_checked(&[
                "submodule",
                "--quiet",
                "foreach",
                "--recursive",
                "echo \"$toplevel/$sm_path\"",
            ])
            .await?;
        Ok(listing
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(PathBuf::from)
            .collect())
    }

    fn submodule(&self, path: &Path) -> Box<dyn Vcs> {
        Box::new(GitCli::new(path))
    }
}
