// ABOUTME: Typed per-node status record read from the fleet status store.
// ABOUTME: Every field is independently optional since nodes write them without coordination.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::types::RepoName;

pub const FETCH_STATUS: &str = "fetch_status";
pub const FETCH_CHECKIN_TIMESTAMP: &str = "fetch_checkin_timestamp";
pub const FETCH_TIMESTAMP: &str = "fetch_timestamp";
pub const FETCH_TAG: &str = "fetch_tag";
pub const CHECKOUT_STATUS: &str = "checkout_status";
pub const CHECKOUT_CHECKIN_TIMESTAMP: &str = "checkout_checkin_timestamp";
pub const CHECKOUT_TIMESTAMP: &str = "checkout_timestamp";
pub const TAG: &str = "tag";
pub const RESTART_STATUS: &str = "restart_status";
pub const RESTART_CHECKIN_TIMESTAMP: &str = "restart_checkin_timestamp";
pub const RESTART_TIMESTAMP: &str = "restart_timestamp";

/// Set holding the ids of every node registered for `repo`.
pub fn minions_key(repo: &RepoName) -> String {
    format!("deploy:{repo}:minions")
}

/// Hash holding the status fields of one node.
pub fn minion_key(repo: &RepoName, node: &str) -> String {
    format!("deploy:{repo}:minions:{node}")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeStatus {
    pub fetch_status: Option<String>,
    pub fetch_checkin: Option<DateTime<Utc>>,
    pub fetch_time: Option<DateTime<Utc>>,
    pub fetch_tag: Option<String>,
    pub checkout_status: Option<String>,
    pub checkout_checkin: Option<DateTime<Utc>>,
    pub checkout_time: Option<DateTime<Utc>>,
    pub tag: Option<String>,
    pub restart_status: Option<String>,
    pub restart_checkin: Option<DateTime<Utc>>,
    pub restart_time: Option<DateTime<Utc>>,
}

impl NodeStatus {
    /// Build from raw hash fields. Empty or unparsable values are absent.
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        let text = |name: &str| {
            fields
                .get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let time = |name: &str| fields.get(name).and_then(|v| parse_epoch(name, v));

        Self {
            fetch_status: text(FETCH_STATUS),
            fetch_checkin: time(FETCH_CHECKIN_TIMESTAMP),
            fetch_time: time(FETCH_TIMESTAMP),
            fetch_tag: text(FETCH_TAG),
            checkout_status: text(CHECKOUT_STATUS),
            checkout_checkin: time(CHECKOUT_CHECKIN_TIMESTAMP),
            checkout_time: time(CHECKOUT_TIMESTAMP),
            tag: text(TAG),
            restart_status: text(RESTART_STATUS),
            restart_checkin: time(RESTART_CHECKIN_TIMESTAMP),
            restart_time: time(RESTART_TIMESTAMP),
        }
    }

    pub fn has_fetch_data(&self) -> bool {
        self.fetch_status.is_some() || self.fetch_checkin.is_some() || self.fetch_time.is_some()
    }

    pub fn has_checkout_data(&self) -> bool {
        self.checkout_status.is_some()
            || self.checkout_checkin.is_some()
            || self.checkout_time.is_some()
    }

    pub fn has_restart_data(&self) -> bool {
        self.restart_status.is_some()
            || self.restart_checkin.is_some()
            || self.restart_time.is_some()
    }
}

/// Parse Unix epoch seconds, integer or fractional.
fn parse_epoch(field: &str, raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let parsed = raw.parse::<f64>().ok().filter(|s| s.is_finite()).and_then(|secs| {
        let whole = secs.floor();
        let nanos = ((secs - whole) * 1e9) as u32;
        DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
    });
    if parsed.is_none() {
        tracing::debug!("Ignoring unparsable {} value: {}", field, raw);
    }
    parsed
}
