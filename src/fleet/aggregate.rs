// ABOUTME: Aggregation of fleet node records into progress summaries.
// ABOUTME: Partitions a snapshot into complete and pending nodes per phase.

use chrono::{DateTime, Utc};
use std::fmt;

use super::status::NodeStatus;

/// A fleet-side phase whose progress can be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportPhase {
    Fetch,
    Checkout,
    Restart,
}

impl ReportPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPhase::Fetch => "fetch",
            ReportPhase::Checkout => "checkout",
            ReportPhase::Restart => "restart",
        }
    }

    /// Whether `status` counts as done for this phase.
    ///
    /// Fetch and checkout are done once the node reports the target tag;
    /// restart is done once the node reports a zero exit status.
    pub fn is_complete(&self, status: &NodeStatus, target: Option<&str>) -> bool {
        match self {
            ReportPhase::Fetch => target.is_some() && status.fetch_tag.as_deref() == target,
            ReportPhase::Checkout => target.is_some() && status.tag.as_deref() == target,
            ReportPhase::Restart => status.restart_status.as_deref() == Some("0"),
        }
    }

    pub fn has_data(&self, status: &NodeStatus) -> bool {
        match self {
            ReportPhase::Fetch => status.has_fetch_data(),
            ReportPhase::Checkout => status.has_checkout_data(),
            ReportPhase::Restart => status.has_restart_data(),
        }
    }
}

impl fmt::Display for ReportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which part of a sync a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncScope {
    Fetch,
    Checkout,
    Full,
}

impl SyncScope {
    pub fn phases(&self) -> &'static [ReportPhase] {
        match self {
            SyncScope::Fetch => &[ReportPhase::Fetch],
            SyncScope::Checkout => &[ReportPhase::Checkout],
            SyncScope::Full => &[ReportPhase::Fetch, ReportPhase::Checkout],
        }
    }
}

/// Whole minutes elapsed since `recorded`, rounded down.
///
/// An absent timestamp has no age; it is never reported as zero.
pub fn minutes_since(now: DateTime<Utc>, recorded: Option<DateTime<Utc>>) -> Option<i64> {
    recorded.map(|t| (now - t).num_seconds().div_euclid(60))
}

/// Disjoint split of a node set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub complete: Vec<String>,
    pub pending: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseSummary {
    pub phase: ReportPhase,
    pub complete: usize,
    pub total: usize,
}

impl fmt::Display for PhaseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} minions completed {}",
            self.complete, self.total, self.phase
        )
    }
}

/// Human-readable progress: one summary per phase, then optional per-node lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetReport {
    pub summaries: Vec<PhaseSummary>,
    pub details: Vec<String>,
}

impl FleetReport {
    pub fn lines(&self) -> Vec<String> {
        self.summaries
            .iter()
            .map(ToString::to_string)
            .chain(self.details.iter().cloned())
            .collect()
    }
}

/// Point-in-time copy of every node record for a repository.
///
/// Two snapshots taken back to back may differ: nodes write without
/// coordinating with readers, and a record may be half updated.
#[derive(Debug, Clone, Default)]
pub struct FleetSnapshot {
    nodes: Vec<(String, NodeStatus)>,
}

impl FleetSnapshot {
    pub fn new(nodes: Vec<(String, NodeStatus)>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[(String, NodeStatus)] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn partition(&self, phase: ReportPhase, target: Option<&str>) -> Partition {
        let (complete, pending): (Vec<_>, Vec<_>) = self
            .nodes
            .iter()
            .partition(|(_, status)| phase.is_complete(status, target));
        Partition {
            complete: complete.into_iter().map(|(id, _)| id.clone()).collect(),
            pending: pending.into_iter().map(|(id, _)| id.clone()).collect(),
        }
    }

    fn summary(&self, phase: ReportPhase, target: Option<&str>) -> PhaseSummary {
        PhaseSummary {
            phase,
            complete: self.partition(phase, target).complete.len(),
            total: self.nodes.len(),
        }
    }

    pub fn sync_report(
        &self,
        target: &str,
        scope: SyncScope,
        detailed: bool,
        now: DateTime<Utc>,
    ) -> FleetReport {
        let summaries = scope
            .phases()
            .iter()
            .map(|phase| self.summary(*phase, Some(target)))
            .collect();

        let details = if detailed {
            self.nodes
                .iter()
                .filter(|(_, status)| scope.phases().iter().any(|p| p.has_data(status)))
                .map(|(node, status)| {
                    format!(
                        "{node}: {}; {}",
                        fetch_segment(status, now),
                        checkout_segment(status, now)
                    )
                })
                .collect()
        } else {
            Vec::new()
        };

        FleetReport { summaries, details }
    }

    pub fn restart_report(&self, detailed: bool, now: DateTime<Utc>) -> FleetReport {
        let summaries = vec![self.summary(ReportPhase::Restart, None)];
        let details = if detailed {
            self.nodes
                .iter()
                .filter(|(_, status)| status.has_restart_data())
                .map(|(node, status)| format!("{node}: {}", restart_segment(status, now)))
                .collect()
        } else {
            Vec::new()
        };
        FleetReport { summaries, details }
    }
}

fn age(now: DateTime<Utc>, recorded: Option<DateTime<Utc>>) -> String {
    match minutes_since(now, recorded) {
        Some(minutes) => format!("{minutes} min ago"),
        None => "unknown".to_string(),
    }
}

fn status_text(status: Option<&str>) -> &str {
    status.unwrap_or("no status")
}

fn fetch_segment(status: &NodeStatus, now: DateTime<Utc>) -> String {
    format!(
        "fetch {} (tag {}, checkin {}, fetched {})",
        status_text(status.fetch_status.as_deref()),
        status.fetch_tag.as_deref().unwrap_or("none"),
        age(now, status.fetch_checkin),
        age(now, status.fetch_time),
    )
}

fn checkout_segment(status: &NodeStatus, now: DateTime<Utc>) -> String {
    format!(
        "checkout {} (tag {}, checkin {}, checked out {})",
        status_text(status.checkout_status.as_deref()),
        status.tag.as_deref().unwrap_or("none"),
        age(now, status.checkout_checkin),
        age(now, status.checkout_time),
    )
}

fn restart_segment(status: &NodeStatus, now: DateTime<Utc>) -> String {
    format!(
        "restart {} (checkin {}, restarted {})",
        status_text(status.restart_status.as_deref()),
        age(now, status.restart_checkin),
        age(now, status.restart_time),
    )
}
