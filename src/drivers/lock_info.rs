// ABOUTME: Contents of the deployment lock file: who holds it and since when.
// ABOUTME: Parsing is lenient so a corrupt lock never crashes the caller.

use serde::{Deserialize, Serialize};

use crate::types::DeployTimestamp;

/// Information about who holds the deployment lock.
///
/// Every field is optional: a lock file that cannot be parsed still means a
/// deployment is in progress, just by an unknown holder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockInfo {
    pub held_by: Option<String>,
    pub since: Option<DeployTimestamp>,
    pub host: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct LockFile {
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    host: Option<String>,
}

impl LockInfo {
    /// Lock info for `holder` acquiring the lock now on this machine.
    pub fn new(holder: &str) -> Self {
        Self {
            held_by: Some(holder.to_string()),
            since: Some(DeployTimestamp::now()),
            host: Some(gethostname::gethostname().to_string_lossy().into_owned()),
        }
    }

    pub fn from_json(content: &str) -> Self {
        match serde_json::from_str::<LockFile>(content) {
            Ok(file) => Self {
                held_by: file.user.filter(|u| !u.is_empty()),
                since: file.time.and_then(|t| DeployTimestamp::parse(&t).ok()),
                host: file.host,
            },
            Err(e) => {
                tracing::debug!("Lock file is not valid JSON ({}), holder unknown", e);
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&LockFile {
            time: self.since.map(|t| t.to_string()),
            user: self.held_by.clone(),
            host: self.host.clone(),
        })
    }

    /// Whether the lock names no holder.
    pub fn is_unknown(&self) -> bool {
        self.held_by.is_none()
    }

    pub fn is_held_by(&self, user: &str) -> bool {
        self.held_by.as_deref() == Some(user)
    }

    /// "alice@deploy01 since 20240101-000000", degrading field by field.
    pub fn describe_holder(&self) -> String {
        let mut who = self
            .held_by
            .clone()
            .unwrap_or_else(|| "an unknown user".to_string());
        if let Some(host) = &self.host {
            who.push('@');
            who.push_str(host);
        }
        match self.since {
            Some(since) => format!("{who} since {since}"),
            None => who,
        }
    }
}
