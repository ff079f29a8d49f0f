// ABOUTME: Validated domain types shared across drivers and the orchestrator.
// ABOUTME: Repository names, deployment timestamps and tags, and batch selectors.

mod batch;
mod repo_name;
mod tag;
mod timestamp;

pub use batch::{BatchSpec, BatchSpecError};
pub use repo_name::{RepoName, RepoNameError};
pub use tag::{DeployTag, ParseTagError, Phase};
pub use timestamp::{DeployTimestamp, ParseTimestampError, TIMESTAMP_FORMAT};
