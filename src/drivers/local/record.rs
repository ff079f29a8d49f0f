// ABOUTME: Deploy record: metadata about the most recently synced tag.
// ABOUTME: Stored as JSON at <git-dir>/deploy/deploy and overwritten on every sync.

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;

use crate::drivers::SyncError;
use crate::types::{DeployTag, DeployTimestamp};

pub const DEPLOY_FILE: &str = "deploy";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployRecord {
    pub tag: String,
    #[serde(rename = "sync-time")]
    pub sync_time: DeployTimestamp,
    pub time: DeployTimestamp,
    pub user: String,
}

impl DeployRecord {
    /// Record for `tag`, synced by `user` now.
    pub fn new(tag: &DeployTag, user: &str) -> Self {
        Self {
            tag: tag.name(),
            sync_time: tag.timestamp(),
            time: DeployTimestamp::now(),
            user: user.to_string(),
        }
    }

    pub async fn write(&self, path: &Path) -> Result<(), SyncError> {
        let io_error = |source: std::io::Error| SyncError::DeployFile {
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_string(self).map_err(|e| io_error(std::io::Error::other(e)))?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        tokio::fs::write(path, json).await.map_err(io_error)
    }

    /// Read the record back, telling "never synced" apart from a corrupt file.
    pub async fn read(path: &Path) -> Result<Self, SyncError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => SyncError::NeverSynced {
                    path: path.to_path_buf(),
                },
                _ => SyncError::CorruptRecord {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                },
            })?;
        serde_json::from_str(&content).map_err(|e| SyncError::CorruptRecord {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Phase, RepoName};
    use tempfile::TempDir;

    fn tag() -> DeployTag {
        DeployTag::new(
            RepoName::new("web").unwrap(),
            Phase::Sync,
            DeployTimestamp::parse("20240101-000000").unwrap(),
        )
    }

    #[test]
    fn uses_hyphenated_sync_time_key() {
        let record = DeployRecord::new(&tag(), "alice");
        let value: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["tag"], "web-sync-20240101-000000");
        assert_eq!(value["sync-time"], "20240101-000000");
        assert_eq!(value["user"], "alice");
        assert!(value["time"].is_string());
    }

    #[tokio::test]
    async fn write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deploy").join(DEPLOY_FILE);
        let record = DeployRecord::new(&tag(), "alice");

        record.write(&path).await.unwrap();
        assert_eq!(DeployRecord::read(&path).await.unwrap(), record);
    }

    #[tokio::test]
    async fn missing_and_corrupt_are_distinct() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEPLOY_FILE);

        let missing = DeployRecord::read(&path).await.unwrap_err();
        assert_eq!(missing.code(), 5);

        std::fs::write(&path, r#"{"tag": "web-sync-20240101-000000"}"#).unwrap();
        let corrupt = DeployRecord::read(&path).await.unwrap_err();
        assert_eq!(corrupt.code(), 6);
    }
}
