// src/types.rs

//! Identifiers and small value types shared by the entity tables and the engine.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Caller-assigned job identifier (unique within a workload).
pub type JobId = usize;

/// Index of a worker in the engine's worker table.
pub type WorkerId = usize;

/// Index of a task inside its operation.
pub type TaskId = usize;

/// Worker hardware class; duration models are keyed by it.
pub type WorkerType = usize;

/// Handle of an operation: the owning job plus the operation's index in that
/// job's operation list.
///
/// Ordering is `(job, index)`, which gives the engine a deterministic
/// iteration order over frontier/saturated sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpId {
    pub job: JobId,
    pub index: usize,
}

impl OpId {
    pub fn new(job: JobId, index: usize) -> Self {
        Self { job, index }
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.job, self.index)
    }
}

/// Scheduling decision handed to `SimulationEngine::step`.
///
/// `workers` is an upper bound; the engine sends as many compatible available
/// workers as it can, up to the operation's remaining task count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub op: OpId,
    pub workers: usize,
}

impl Action {
    pub fn new(op: OpId, workers: usize) -> Self {
        Self { op, workers }
    }
}

/// How the delay of moving a worker between jobs is drawn.
///
/// - `Exponential`: exponentially distributed with mean `moving_cost`
///   (default).
/// - `Constant`: exactly `moving_cost`; used for reproducible tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransitMode {
    #[default]
    Exponential,
    Constant,
}

impl FromStr for TransitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exponential" => Ok(TransitMode::Exponential),
            "constant" => Ok(TransitMode::Constant),
            other => Err(format!(
                "invalid transit mode: {other} (expected \"exponential\" or \"constant\")"
            )),
        }
    }
}
