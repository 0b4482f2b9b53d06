use std::collections::HashMap;

use serde::Serialize;

use super::error::TriggerError;
use crate::models::assertion::{self, Assertion};
use crate::models::{HeaderPair, JobType, Monitor, MonitorInvalid, MonitorStatus};

/// Check request body sent to the execution tier, tagged by job type.
///
/// Field names and casing are the checker's wire contract; ids travel as
/// strings and the trigger timestamp as unix milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CheckPayload {
    Http(HttpCheckPayload),
    Tcp(TcpCheckPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpCheckPayload {
    pub workspace_id: String,
    pub monitor_id: String,
    pub url: String,
    pub method: String,
    pub cron_timestamp: i64,
    pub body: String,
    pub headers: Vec<HeaderPair>,
    pub status: MonitorStatus,
    pub assertions: Option<Vec<Assertion>>,
    pub degraded_after: Option<i64>,
    pub timeout: i64,
    pub trigger: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpCheckPayload {
    pub workspace_id: String,
    pub monitor_id: String,
    pub uri: String,
    pub status: MonitorStatus,
    pub assertions: Option<Vec<Assertion>>,
    pub cron_timestamp: i64,
    pub degraded_after: Option<i64>,
    pub timeout: i64,
    pub trigger: String,
}

/// Build the check request for one region.
///
/// The region's last-known status is injected into the payload so the
/// checker can detect transitions; a region with no status row is `active`.
/// Stored assertions are deserialized on every build, and a malformed value
/// aborts the build rather than shipping a check without its rules.
pub fn build_payload(
    monitor: &Monitor,
    region: &str,
    statuses: &HashMap<String, MonitorStatus>,
    cron_timestamp: i64,
) -> Result<CheckPayload, TriggerError> {
    let status = statuses.get(region).copied().unwrap_or_default();

    let assertions = match monitor.assertions.as_deref() {
        Some(raw) => Some(
            assertion::parse_assertions(raw)
                .map_err(|err| TriggerError::from(MonitorInvalid::BadAssertions(err)))?,
        ),
        None => None,
    };

    let payload = match monitor.job_type {
        JobType::Http => CheckPayload::Http(HttpCheckPayload {
            workspace_id: monitor.workspace_id.to_string(),
            monitor_id: monitor.id.to_string(),
            url: monitor.url.clone(),
            method: monitor.method.clone().unwrap_or_else(|| "GET".to_string()),
            cron_timestamp,
            body: monitor.body.clone(),
            headers: monitor.headers.clone(),
            status,
            assertions,
            degraded_after: monitor.degraded_after,
            timeout: monitor.timeout,
            trigger: "api".to_string(),
        }),
        JobType::Tcp => CheckPayload::Tcp(TcpCheckPayload {
            workspace_id: monitor.workspace_id.to_string(),
            monitor_id: monitor.id.to_string(),
            uri: monitor.url.clone(),
            status,
            assertions,
            cron_timestamp,
            degraded_after: monitor.degraded_after,
            timeout: monitor.timeout,
            trigger: "api".to_string(),
        }),
    };

    Ok(payload)
}
