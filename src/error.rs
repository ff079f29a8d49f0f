// ABOUTME: Application-wide error type for the trigger binary.
// ABOUTME: Uses thiserror and maps every failure to its process exit code.

use thiserror::Error;

use crate::config::ConfigurationError;
use crate::deploy::OrchestratorError;
use crate::dispatch::DispatchError;
use crate::git::VcsError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigurationError),

    #[error("not in a git repository: {0}")]
    Repository(#[from] VcsError),

    #[error("invalid dispatch command: {0}")]
    Dispatcher(#[from] DispatchError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

impl Error {
    /// Exit code for the process. Everything raised before the orchestrator
    /// runs is a startup configuration failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(e) => e.code(),
            Error::Orchestrator(e) => e.code(),
            Error::Repository(_) | Error::Dispatcher(_) | Error::Io(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_failures_exit_with_one() {
        let err: Error = ConfigurationError::MissingKeys(vec!["deploy.repo-name".into()]).into();
        assert_eq!(err.exit_code(), 1);
        let err: Error = DispatchError::EmptyCommand.into();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn orchestrator_failures_keep_their_code() {
        let err: Error = OrchestratorError::DirtyTree.into();
        assert_eq!(err.exit_code(), 161);
    }
}
