// ABOUTME: Redis/Valkey-backed fleet status store.
// ABOUTME: Reads the minion set and per-minion hashes through a deadpool connection pool.

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime, redis::AsyncCommands};
use std::collections::HashMap;

use super::status::{NodeStatus, minion_key, minions_key};
use super::store::{FleetStatusStore, StoreError};
use crate::types::RepoName;

#[derive(Clone)]
pub struct RedisStatusStore {
    pool: Pool,
}

impl std::fmt::Debug for RedisStatusStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStatusStore").finish_non_exhaustive()
    }
}

impl RedisStatusStore {
    /// Create a pool for `url`. Connections are opened on first use.
    pub fn new(url: &str) -> Result<Self, StoreError> {
        let pool = Config::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }
}

#[async_trait]
impl FleetStatusStore for RedisStatusStore {
    async fn node_ids(&self, repo: &RepoName) -> Result<Vec<String>, StoreError> {
        let mut conn = self.connection().await?;
        let mut ids: Vec<String> = conn
            .smembers(minions_key(repo))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        ids.sort();
        Ok(ids)
    }

    async fn node_status(&self, repo: &RepoName, node: &str) -> Result<NodeStatus, StoreError> {
        let mut conn = self.connection().await?;
        let fields: HashMap<String, String> = conn
            .hgetall(minion_key(repo, node))
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(NodeStatus::from_fields(&fields))
    }
}
