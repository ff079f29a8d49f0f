// ABOUTME: Validated repository name used as the prefix of deployment tags.
// ABOUTME: Rejects names that would produce an invalid git ref or status store key.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepoNameError {
    #[error("repository name cannot be empty")]
    Empty,

    #[error("repository name cannot start with '{0}'")]
    InvalidStart(char),

    #[error("repository name cannot end with '.lock' or '.'")]
    InvalidEnd,

    #[error("repository name cannot contain '..'")]
    DoubleDot,

    #[error("invalid character in repository name: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoName(String);

impl RepoName {
    pub fn new(value: &str) -> Result<Self, RepoNameError> {
        let Some(first) = value.chars().next() else {
            return Err(RepoNameError::Empty);
        };

        if first == '-' || first == '.' {
            return Err(RepoNameError::InvalidStart(first));
        }

        if value.ends_with(".lock") || value.ends_with('.') {
            return Err(RepoNameError::InvalidEnd);
        }

        if value.contains("..") {
            return Err(RepoNameError::DoubleDot);
        }

        // ':' is the status store key separator, the rest are forbidden in git refs.
        for c in value.chars() {
            if c.is_whitespace()
                || c.is_control()
                || matches!(c, ':' | '~' | '^' | '?' | '*' | '[' | '\\' | '@' | '{')
            {
                return Err(RepoNameError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
