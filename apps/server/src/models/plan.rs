use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown plan: {0}")]
pub struct UnknownPlan(String);

/// Billing plan a workspace is subscribed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Starter,
    Team,
}

impl FromStr for Plan {
    type Err = UnknownPlan;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Plan::Free),
            "starter" => Ok(Plan::Starter),
            "team" => Ok(Plan::Team),
            other => Err(UnknownPlan(other.to_string())),
        }
    }
}

impl Plan {
    /// Usage ceilings granted by this plan.
    pub fn limits(self) -> Limits {
        match self {
            Plan::Free => Limits { synthetic_checks: 30 },
            Plan::Starter => Limits { synthetic_checks: 1_000 },
            Plan::Team => Limits { synthetic_checks: 5_000 },
        }
    }
}

/// Per-plan ceilings enforced at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Manually triggered check runs allowed per trailing month.
    pub synthetic_checks: i64,
}

/// Workspace identity resolved from an api key.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub id: i64,
    pub slug: String,
    pub plan: Plan,
}
