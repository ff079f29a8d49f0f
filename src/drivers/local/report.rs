// ABOUTME: Report driver that aggregates node records from the fleet status store.
// ABOUTME: Every call reads a fresh snapshot; nothing is cached between reports.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::drivers::{ReportDriver, ReportError};
use crate::fleet::{self, FleetReport, FleetStatusStore, SyncScope};
use crate::types::RepoName;

pub struct StoreReportDriver {
    repo: RepoName,
    store: Arc<dyn FleetStatusStore>,
}

impl StoreReportDriver {
    pub fn new(repo: RepoName, store: Arc<dyn FleetStatusStore>) -> Self {
        Self { repo, store }
    }
}

#[async_trait]
impl ReportDriver for StoreReportDriver {
    async fn report_sync(
        &self,
        tag: &str,
        scope: SyncScope,
        detailed: bool,
    ) -> Result<FleetReport, ReportError> {
        let snapshot = fleet::snapshot(self.store.as_ref(), &self.repo).await?;
        tracing::debug!("Read {} node records for {}", snapshot.len(), self.repo);
        Ok(snapshot.sync_report(tag, scope, detailed, Utc::now()))
    }

    async fn report_service(&self, detailed: bool) -> Result<FleetReport, ReportError> {
        let snapshot = fleet::snapshot(self.store.as_ref(), &self.repo).await?;
        Ok(snapshot.restart_report(detailed, Utc::now()))
    }
}
