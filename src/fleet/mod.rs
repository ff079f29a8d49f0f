// ABOUTME: Fleet status: per-node records, the store they live in, and aggregation.
// ABOUTME: Reports are computed from point-in-time snapshots of the store.

mod aggregate;
mod memory;
mod redis;
pub mod status;
mod store;

pub use aggregate::{
    FleetReport, FleetSnapshot, Partition, PhaseSummary, ReportPhase, SyncScope, minutes_since,
};
pub use memory::MemoryStatusStore;
pub use redis::RedisStatusStore;
pub use status::NodeStatus;
pub use store::{FleetStatusStore, StoreError};

use crate::types::RepoName;

/// Read every registered node's record for `repo`.
pub async fn snapshot(
    store: &dyn FleetStatusStore,
    repo: &RepoName,
) -> Result<FleetSnapshot, StoreError> {
    let ids = store.node_ids(repo).await?;
    let mut nodes = Vec::with_capacity(ids.len());
    for id in ids {
        let status = store.node_status(repo, &id).await?;
        nodes.push((id, status));
    }
    Ok(FleetSnapshot::new(nodes))
}
