use thiserror::Error;

use crate::models::MonitorInvalid;

/// Failure modes of a trigger invocation, all raised before dispatch.
///
/// Once dispatch has started, individual regional failures are counted and
/// logged but never propagated; the run id is returned regardless.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// The workspace exhausted its monthly synthetic-check allowance.
    #[error("monthly synthetic-check quota exhausted")]
    QuotaExceeded,

    /// No monitor with this id is owned by the workspace, or it was
    /// soft-deleted.
    #[error("monitor not found")]
    MonitorNotFound,

    /// Stored data failed validation on its way out of the database.
    #[error("stored monitor data failed validation: {0}")]
    SchemaInvalid(String),

    /// The run insert reported no created row.
    #[error("run insert did not produce a row")]
    RunNotRecorded,

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

impl From<MonitorInvalid> for TriggerError {
    fn from(err: MonitorInvalid) -> Self {
        Self::SchemaInvalid(err.to_string())
    }
}
