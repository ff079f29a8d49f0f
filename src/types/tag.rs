// ABOUTME: Deployment phases and the immutable tags that mark them.
// ABOUTME: Tags are named {repo}-{phase}-{YYYYMMDD-HHMMSS}.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::repo_name::{RepoName, RepoNameError};
use super::timestamp::{DeployTimestamp, ParseTimestampError, TIMESTAMP_LEN};

/// A tagged milestone in a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Start,
    Sync,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Start => "start",
            Phase::Sync => "sync",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Phase::Start),
            "sync" => Ok(Phase::Sync),
            other => Err(ParseTagError::UnknownPhase(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseTagError {
    #[error("tag does not have the form {{repo}}-{{phase}}-{{timestamp}}")]
    Malformed,

    #[error("unknown deployment phase: {0}")]
    UnknownPhase(String),

    #[error(transparent)]
    Repo(#[from] RepoNameError),

    #[error(transparent)]
    Timestamp(#[from] ParseTimestampError),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeployTag {
    repo: RepoName,
    phase: Phase,
    timestamp: DeployTimestamp,
}

impl DeployTag {
    pub fn new(repo: RepoName, phase: Phase, timestamp: DeployTimestamp) -> Self {
        Self {
            repo,
            phase,
            timestamp,
        }
    }

    /// Parse a tag name produced by [`DeployTag::name`].
    ///
    /// The repository name may itself contain hyphens, so the name is
    /// split from the right: fixed-width timestamp first, then the phase.
    pub fn parse(name: &str) -> Result<Self, ParseTagError> {
        let split = name
            .len()
            .checked_sub(TIMESTAMP_LEN + 1)
            .ok_or(ParseTagError::Malformed)?;
        if !name.is_char_boundary(split) {
            return Err(ParseTagError::Malformed);
        }
        let (rest, timestamp) = name.split_at(split);
        let timestamp = timestamp
            .strip_prefix('-')
            .ok_or(ParseTagError::Malformed)?;
        let (repo, phase) = rest.rsplit_once('-').ok_or(ParseTagError::Malformed)?;

        Ok(Self {
            repo: RepoName::new(repo)?,
            phase: phase.parse()?,
            timestamp: DeployTimestamp::parse(timestamp)?,
        })
    }

    /// The most recent tag of `phase` for `repo` among `names`.
    ///
    /// Names that are not deployment tags for this repository are ignored.
    /// On equal timestamps the later name in the listing wins.
    pub fn latest<'a, I>(names: I, repo: &RepoName, phase: Phase) -> Option<DeployTag>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .filter_map(|name| DeployTag::parse(name).ok())
            .filter(|tag| tag.phase == phase && &tag.repo == repo)
            .fold(None, |latest: Option<DeployTag>, tag| match latest {
                Some(current) if current.timestamp > tag.timestamp => Some(current),
                _ => Some(tag),
            })
    }

    pub fn name(&self) -> String {
        format!("{}-{}-{}", self.repo, self.phase, self.timestamp)
    }

    pub fn repo(&self) -> &RepoName {
        &self.repo
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn timestamp(&self) -> DeployTimestamp {
        self.timestamp
    }
}

impl fmt::Display for DeployTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.repo, self.phase, self.timestamp)
    }
}
