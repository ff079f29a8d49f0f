// ABOUTME: In-process fleet status store with the same key layout as Redis.
// ABOUTME: Lets reports run without a server; nodes are simulated with set_field.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::status::{NodeStatus, minion_key, minions_key};
use super::store::{FleetStatusStore, StoreError};
use crate::types::RepoName;

#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    sets: Mutex<BTreeMap<String, BTreeSet<String>>>,
    hashes: Mutex<BTreeMap<String, HashMap<String, String>>>,
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `node` to the minion set of `repo`.
    pub fn register(&self, repo: &RepoName, node: &str) {
        self.sets
            .lock()
            .entry(minions_key(repo))
            .or_default()
            .insert(node.to_string());
    }

    /// Remove `node` from the minion set; its hash is left behind, as in Redis.
    pub fn deregister(&self, repo: &RepoName, node: &str) {
        if let Some(set) = self.sets.lock().get_mut(&minions_key(repo)) {
            set.remove(node);
        }
    }

    /// Write one status field, registering the node if needed.
    pub fn set_field(&self, repo: &RepoName, node: &str, field: &str, value: impl Into<String>) {
        self.register(repo, node);
        self.hashes
            .lock()
            .entry(minion_key(repo, node))
            .or_default()
            .insert(field.to_string(), value.into());
    }
}

#[async_trait]
impl FleetStatusStore for MemoryStatusStore {
    async fn node_ids(&self, repo: &RepoName) -> Result<Vec<String>, StoreError> {
        Ok(self
            .sets
            .lock()
            .get(&minions_key(repo))
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn node_status(&self, repo: &RepoName, node: &str) -> Result<NodeStatus, StoreError> {
        let hashes = self.hashes.lock();
        Ok(hashes
            .get(&minion_key(repo, node))
            .map(NodeStatus::from_fields)
            .unwrap_or_default())
    }
}
