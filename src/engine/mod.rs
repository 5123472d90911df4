// src/engine/mod.rs

//! Discrete-event simulation engine.
//!
//! This module ties together:
//! - the event timeline (the simulation clock)
//! - the worker pool
//! - the per-event handlers that move jobs, operations and workers between
//!   states
//! - the decision loop that consults an agent whenever the engine stops
//!
//! The engine itself ([`core`]) is synchronous and deterministic; it never
//! calls the agent. [`runtime`] is the thin loop around it that does.

use crate::dag::Job;
use crate::types::{OpId, TaskId, TransitMode, WorkerId};

/// Scheduling events. The set is closed; handlers match on it exhaustively.
#[derive(Debug, Clone)]
pub enum Event {
    /// A job enters the system. The event owns the job until it is
    /// registered with the engine.
    JobArrival { job: Box<Job> },
    /// A worker in transit reaches the job of `op`.
    ///
    /// `token` must match the worker's current transit token; otherwise the
    /// transit was superseded and the event is dropped.
    WorkerArrival {
        worker: WorkerId,
        op: OpId,
        token: u64,
    },
    /// A task finished on the worker it was bound to.
    TaskCompletion { op: OpId, task: TaskId },
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::JobArrival { .. } => "job_arrival",
            Event::WorkerArrival { .. } => "worker_arrival",
            Event::TaskCompletion { .. } => "task_completion",
        }
    }
}

/// Engine parameters fixed for the lifetime of an episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineOptions {
    /// Multiplied into the reward to control its magnitude.
    pub reward_scale: f64,
    /// Mean (exponential mode) or exact (constant mode) time to move a worker
    /// between jobs.
    pub moving_cost: f64,
    pub transit: TransitMode,
    /// Episode truncation bound on simulated wall time.
    pub max_wall_time: Option<f64>,
    /// Seed for task-duration and transit sampling.
    pub seed: u64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            reward_scale: 1e-5,
            moving_cost: 2000.0,
            transit: TransitMode::Exponential,
            max_wall_time: None,
            seed: 0,
        }
    }
}

/// Result of one `SimulationEngine::step`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResult {
    /// Negative scaled job-time accrued since the previous step.
    pub reward: f64,
    /// No further events can occur (or the wall-time bound was hit).
    pub done: bool,
}

pub mod audit;
pub mod core;
pub mod event_handlers;
pub mod mask;
pub mod runtime;
pub mod timeline;
pub mod worker;

pub use audit::{InvariantViolation, audit};
pub use self::core::SimulationEngine;
pub use mask::ActionMask;
pub use runtime::{EpisodeSummary, run_episode, run_episodes_parallel};
pub use timeline::Timeline;
pub use worker::{Worker, WorkerState};
