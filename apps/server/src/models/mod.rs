pub mod assertion;
pub mod monitor;
pub mod plan;

pub use assertion::{Assertion, Compare};
pub use monitor::{HeaderPair, JobType, Monitor, MonitorInvalid, MonitorStatus};
pub use plan::{Limits, Plan, Workspace};
