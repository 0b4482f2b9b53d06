use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::database::models::MonitorRow;

/// Validation failure turning a stored monitor row into the domain model.
///
/// These indicate storage drift, not caller mistakes; the detail is logged
/// internally and surfaced to the client as a generic error.
#[derive(Debug, Error)]
pub enum MonitorInvalid {
    #[error("unknown job type: {0}")]
    UnknownJobType(String),
    #[error("unknown monitor status: {0}")]
    UnknownStatus(String),
    #[error("monitor url is empty")]
    EmptyUrl,
    #[error("monitor has no regions configured")]
    NoRegions,
    #[error("stored headers are not valid JSON: {0}")]
    BadHeaders(serde_json::Error),
    #[error("stored assertions are not valid JSON: {0}")]
    BadAssertions(serde_json::Error),
}

/// Kind of probe a monitor performs. Fixed at creation; every stored value
/// is checked against this closed set once, when the row is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobType {
    Http,
    Tcp,
}

impl FromStr for JobType {
    type Err = MonitorInvalid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(JobType::Http),
            "tcp" => Ok(JobType::Tcp),
            other => Err(MonitorInvalid::UnknownJobType(other.to_string())),
        }
    }
}

impl std::fmt::Display for JobType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobType::Http => write!(f, "http"),
            JobType::Tcp => write!(f, "tcp"),
        }
    }
}

/// Last-known health classification of a monitor in one region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorStatus {
    #[default]
    Active,
    Degraded,
    Error,
}

impl FromStr for MonitorStatus {
    type Err = MonitorInvalid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(MonitorStatus::Active),
            "degraded" => Ok(MonitorStatus::Degraded),
            "error" => Ok(MonitorStatus::Error),
            other => Err(MonitorInvalid::UnknownStatus(other.to_string())),
        }
    }
}

impl std::fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorStatus::Active => write!(f, "active"),
            MonitorStatus::Degraded => write!(f, "degraded"),
            MonitorStatus::Error => write!(f, "error"),
        }
    }
}

/// One request header attached to an HTTP probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderPair {
    pub key: String,
    pub value: String,
}

/// A validated monitor definition.
///
/// Assertions stay in their stored serialized form here; they are
/// deserialized on every payload build so a drifted value fails the build
/// rather than being silently dropped.
#[derive(Debug, Clone)]
pub struct Monitor {
    pub id: i64,
    pub workspace_id: i64,
    pub name: String,
    pub job_type: JobType,
    pub url: String,
    pub method: Option<String>,
    pub body: String,
    pub headers: Vec<HeaderPair>,
    pub assertions: Option<String>,
    pub degraded_after: Option<i64>,
    pub timeout: i64,
    pub regions: Vec<String>,
}

impl Monitor {
    /// Validate a stored row into the domain model.
    pub fn from_row(row: MonitorRow) -> Result<Self, MonitorInvalid> {
        let job_type = row.job_type.parse()?;

        if row.url.is_empty() {
            return Err(MonitorInvalid::EmptyUrl);
        }

        let headers = if row.headers.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&row.headers).map_err(MonitorInvalid::BadHeaders)?
        };

        let regions: Vec<String> = row
            .regions
            .split(',')
            .map(str::trim)
            .filter(|region| !region.is_empty())
            .map(str::to_owned)
            .collect();
        if regions.is_empty() {
            return Err(MonitorInvalid::NoRegions);
        }

        Ok(Self {
            id: row.id,
            workspace_id: row.workspace_id,
            name: row.name,
            job_type,
            url: row.url,
            method: row.method,
            body: row.body,
            headers,
            assertions: row.assertions,
            degraded_after: row.degraded_after,
            timeout: row.timeout,
            regions,
        })
    }
}
