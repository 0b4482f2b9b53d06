/// Trigger module - turns one API call into a recorded check run
///
/// A trigger moves through four steps: quota check, monitor resolve, run
/// record, regional fan-out. The first three abort the call on failure;
/// the fan-out is best-effort and only its aggregate outcome is logged.
/// The caller gets the new run id back as soon as every regional request
/// has settled, never the per-region results.
pub mod dispatcher;
pub mod error;
pub mod payload;
pub mod quota;

#[cfg(test)]
mod tests;

pub use dispatcher::{CheckerClient, DispatchSummary};
pub use error::TriggerError;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::database::Database;
use crate::models::{Limits, Monitor, MonitorStatus, Workspace};

/// Orchestrates manual check runs.
#[derive(Clone)]
pub struct TriggerService {
    database: Arc<dyn Database>,
    checker: Arc<CheckerClient>,
}

impl TriggerService {
    pub fn new(database: Arc<dyn Database>, checker: CheckerClient) -> Self {
        Self { database, checker: Arc::new(checker) }
    }

    /// Start a manual check run for one monitor and return the new run id.
    pub async fn trigger_monitor(
        &self,
        workspace: &Workspace,
        limits: &Limits,
        monitor_id: i64,
    ) -> Result<i64, TriggerError> {
        let now = Utc::now();

        quota::check_quota(self.database.as_ref(), workspace.id, limits, now).await?;

        let (monitor, statuses) = self.resolve_monitor(monitor_id, workspace.id).await?;

        // The run row is the caller's receipt; it exists before any
        // regional request leaves the building.
        let run_id = self
            .database
            .insert_run(monitor.id, monitor.workspace_id, now)
            .await?
            .ok_or(TriggerError::RunNotRecorded)?;

        let cron_timestamp = now.timestamp_millis();
        let mut payloads = Vec::with_capacity(monitor.regions.len());
        for region in &monitor.regions {
            payloads.push((
                region.clone(),
                payload::build_payload(&monitor, region, &statuses, cron_timestamp)?,
            ));
        }

        let summary = self.checker.dispatch(&monitor, &payloads).await;
        info!(
            monitor_id = monitor.id,
            run_id,
            accepted = summary.accepted,
            failed = summary.failed,
            "check run dispatched"
        );

        Ok(run_id)
    }

    /// Load and validate a monitor plus its per-region status map.
    async fn resolve_monitor(
        &self,
        monitor_id: i64,
        workspace_id: i64,
    ) -> Result<(Monitor, HashMap<String, MonitorStatus>), TriggerError> {
        let row = self
            .database
            .monitor_for_workspace(monitor_id, workspace_id)
            .await?
            .ok_or(TriggerError::MonitorNotFound)?;

        let monitor = Monitor::from_row(row)?;

        let mut statuses = HashMap::new();
        for status_row in self.database.status_rows(monitor.id).await? {
            statuses.insert(status_row.region, status_row.status.parse::<MonitorStatus>()?);
        }

        Ok((monitor, statuses))
    }
}
