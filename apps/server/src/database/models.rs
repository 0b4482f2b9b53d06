/// Raw monitor row as stored.
///
/// Validated into `models::Monitor` at resolve time; kept raw here so
/// storage drift is caught at one boundary instead of panicking mid-query.
#[derive(Debug, Clone)]
pub struct MonitorRow {
    pub id: i64,
    pub workspace_id: i64,
    pub name: String,
    pub job_type: String,
    pub url: String,
    pub method: Option<String>,
    pub body: String,
    pub headers: String,
    pub assertions: Option<String>,
    pub degraded_after: Option<i64>,
    pub timeout: i64,
    pub regions: String,
}

/// Last-known health state for one (monitor, region) pair.
///
/// Written by the check-execution pipeline; this service only reads it to
/// annotate newly dispatched checks.
#[derive(Debug, Clone)]
pub struct MonitorStatusRow {
    pub monitor_id: i64,
    pub region: String,
    pub status: String,
}
