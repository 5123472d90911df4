// src/dag/mod.rs

//! Job entities and their dependency graphs.
//!
//! - [`graph`] holds the per-job operation DAG.
//! - [`operation`] contains the operation/task state machines.
//! - [`job`] groups operations into a job and tracks its frontier.
//! - [`duration`] provides per-operation task-duration models.

pub mod duration;
pub mod graph;
pub mod job;
pub mod operation;

pub use duration::{DurationModel, EmpiricalDurations, FixedDurations, WaveSamples, Wave};
pub use graph::JobDag;
pub use job::Job;
pub use operation::{OpState, Operation, Task, TaskState};
