// ABOUTME: Service driver that asks the fleet to restart through the dispatcher.
// ABOUTME: Parses the per-node reply into status lines; other actions stay unimplemented.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::dispatch::{CommandDispatcher, FleetFunction};
use crate::drivers::{ServiceDriver, ServiceError, ServiceReport};
use crate::types::{BatchSpec, RepoName};

const NO_STATUS: &str = "no status available";

pub struct SaltServiceDriver {
    repo: RepoName,
    dispatcher: Arc<dyn CommandDispatcher>,
}

impl SaltServiceDriver {
    pub fn new(repo: RepoName, dispatcher: Arc<dyn CommandDispatcher>) -> Self {
        Self { repo, dispatcher }
    }

    fn restart_argument(&self, batch: Option<BatchSpec>) -> String {
        match batch {
            Some(batch) => format!("{},{}", self.repo, batch),
            None => self.repo.to_string(),
        }
    }
}

#[async_trait]
impl ServiceDriver for SaltServiceDriver {
    async fn restart(&self, batch: Option<BatchSpec>) -> Result<ServiceReport, ServiceError> {
        let reply = self
            .dispatcher
            .dispatch(FleetFunction::Restart, &self.restart_argument(batch))
            .await?;
        let report = parse_restart_reply(&reply)?;
        for (node, status) in &report.nodes {
            tracing::debug!("{}: {}", node, status);
        }
        Ok(report)
    }
}

/// Parse a restart reply: an object mapping node id to `{"status": ...}`,
/// possibly wrapped in salt-call's `{"local": ...}` envelope.
pub fn parse_restart_reply(raw: &str) -> Result<ServiceReport, ServiceError> {
    let mut value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| ServiceError::MalformedReply(e.to_string()))?;

    if let Value::Object(map) = &mut value
        && map.len() == 1
        && let Some(inner) = map.remove("local")
    {
        value = inner;
    }

    let nodes = match value {
        Value::String(message) => return Err(ServiceError::DispatchFailed(message)),
        Value::Object(map) => {
            if let Some(Value::String(message)) = map.get("error") {
                return Err(ServiceError::DispatchFailed(message.clone()));
            }
            map
        }
        other => {
            return Err(ServiceError::MalformedReply(format!(
                "expected an object of nodes, got {other}"
            )));
        }
    };

    let nodes = nodes
        .into_iter()
        .map(|(node, entry)| {
            let status = match entry.get("status") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => NO_STATUS.to_string(),
                Some(other) => other.to_string(),
            };
            (node, status)
        })
        .collect();

    Ok(ServiceReport { nodes })
}
