use chrono::{DateTime, Months, Utc};

use super::error::TriggerError;
use crate::database::Database;
use crate::models::Limits;

/// Start of the trailing usage window: one calendar month before `now`,
/// clamped to the end of shorter months (Mar 31 becomes Feb 28/29).
pub fn usage_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(1)).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Deny the trigger when the workspace already used up its monthly
/// synthetic-check allowance.
///
/// Best-effort: the count and the later run insert are separate statements,
/// so concurrent triggers right at the boundary can both pass and overshoot
/// the ceiling by a few runs. The quota is a backpressure signal, not an
/// exact cap.
pub async fn check_quota(
    database: &dyn Database,
    workspace_id: i64,
    limits: &Limits,
    now: DateTime<Utc>,
) -> Result<(), TriggerError> {
    let count = database.count_runs_since(workspace_id, usage_window_start(now)).await?;

    if count >= limits.synthetic_checks {
        return Err(TriggerError::QuotaExceeded);
    }

    Ok(())
}
