// src/agent.rs

//! The decision seam between the engine and whoever schedules.
//!
//! The engine never calls an agent itself; [`crate::engine::run_episode`]
//! does, whenever an action is available.

use crate::engine::SimulationEngine;
use crate::types::Action;

pub trait Agent {
    /// Pick an action for the current state, or `None` to let time advance.
    fn choose_action(&mut self, engine: &SimulationEngine) -> Option<Action>;
}

impl<F> Agent for F
where
    F: FnMut(&SimulationEngine) -> Option<Action>,
{
    fn choose_action(&mut self, engine: &SimulationEngine) -> Option<Action> {
        self(engine)
    }
}

/// First-come-first-served baseline.
///
/// Serves the earliest-arrived job that has a schedulable operation, picking
/// its lowest-index such operation, and offers it every free worker (or at
/// most `parallelism`).
#[derive(Debug, Clone, Copy, Default)]
pub struct FifoAgent {
    pub parallelism: Option<usize>,
}

impl FifoAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parallelism(parallelism: usize) -> Self {
        Self {
            parallelism: Some(parallelism),
        }
    }
}

impl Agent for FifoAgent {
    fn choose_action(&mut self, engine: &SimulationEngine) -> Option<Action> {
        let mask = engine.action_mask();
        if mask.is_empty() {
            return None;
        }

        // Mask ops are sorted by (job, index), so the first hit per job is
        // its lowest-index schedulable operation.
        let op = engine
            .active_jobs()
            .iter()
            .find_map(|&job| mask.ops.iter().copied().find(|op| op.job == job))?;

        let workers = match self.parallelism {
            Some(cap) => cap.min(mask.max_workers),
            None => mask.max_workers,
        };
        Some(Action::new(op, workers))
    }
}
