//! Workflow object lifecycle status.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a workflow object.
///
/// `Halted` and `Waiting` are the two suspension states: the object is
/// persisted, consumes no compute, and re-enters `Running` only through
/// an external decision (`Halted`) or a matching callback (`Waiting`).
/// `Completed` and `Error` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectStatus {
    /// Actively executing pipeline steps.
    Running,
    /// Suspended awaiting a human approval decision.
    Halted,
    /// Suspended awaiting an external callback.
    Waiting,
    /// Finished, whether accepted, rejected, or stopped.
    Completed,
    /// A step failed; the object is parked for operator inspection.
    Error,
}

impl ObjectStatus {
    /// Returns `true` if no further execution can happen without an
    /// operator-triggered replay.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ObjectStatus::Completed | ObjectStatus::Error)
    }

    /// Returns `true` for the two suspension states.
    pub fn is_suspended(&self) -> bool {
        matches!(self, ObjectStatus::Halted | ObjectStatus::Waiting)
    }
}

impl fmt::Display for ObjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectStatus::Running => "running",
            ObjectStatus::Halted => "halted",
            ObjectStatus::Waiting => "waiting",
            ObjectStatus::Completed => "completed",
            ObjectStatus::Error => "error",
        };
        f.write_str(name)
    }
}
