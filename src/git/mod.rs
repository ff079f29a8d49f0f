// ABOUTME: Version-control collaborator consumed by the orchestrator and sync driver.
// ABOUTME: Defines the Vcs capability trait and its git command-line implementation.

mod cli;

pub use cli::GitCli;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("failed to run git {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },
}

/// Black-box version-control operations.
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Create a lightweight tag at HEAD.
    async fn create_tag(&self, name: &str) -> Result<(), VcsError>;

    /// Whether tracked files differ from HEAD (untracked files are ignored).
    async fn is_dirty(&self) -> Result<bool, VcsError>;

    /// Reset index and working tree to the commit a tag points to.
    async fn reset_to(&self, tag: &str) -> Result<(), VcsError>;

    async fn list_tags(&self) -> Result<Vec<String>, VcsError>;

    /// Commit id of HEAD, `None` when the repository has no commits.
    async fn current_head(&self) -> Result<Option<String>, VcsError>;

    /// Regenerate the metadata dumb transports use to discover refs.
    async fn update_server_info(&self) -> Result<(), VcsError>;

    /// Absolute paths of all submodules, recursively.
    async fn submodule_paths(&self) -> Result<Vec<PathBuf>, VcsError>;

    /// The same operations, run inside a submodule checkout.
    fn submodule(&self, path: &Path) -> Box<dyn Vcs>;
}
