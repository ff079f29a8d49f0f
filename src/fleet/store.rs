// ABOUTME: Read-only interface to the shared fleet status store.
// ABOUTME: Nodes write their own records; trigger only reads snapshots.

use async_trait::async_trait;
use thiserror::Error;

use super::status::NodeStatus;
use crate::types::RepoName;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("status store connection failed: {0}")]
    Connection(String),

    #[error("status store query failed: {0}")]
    Query(String),
}

#[async_trait]
pub trait FleetStatusStore: Send + Sync {
    /// Ids of the nodes currently registered for `repo`, sorted.
    async fn node_ids(&self, repo: &RepoName) -> Result<Vec<String>, StoreError>;

    /// Status record of one node. A node without a record has every field absent.
    async fn node_status(&self, repo: &RepoName, node: &str) -> Result<NodeStatus, StoreError>;
}
