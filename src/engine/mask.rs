// src/engine/mask.rs

//! Availability queries used by the decision loop to build observations and
//! action masks.

use crate::engine::core::SimulationEngine;
use crate::types::OpId;

/// Which actions are currently meaningful.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionMask {
    /// Frontier operations with at least one compatible available worker.
    pub ops: Vec<OpId>,
    /// Largest worker count that can change the outcome of an action.
    pub max_workers: usize,
}

impl ActionMask {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn allows(&self, op: OpId) -> bool {
        self.ops.binary_search(&op).is_ok()
    }
}

impl SimulationEngine {
    /// True iff some frontier operation can take some available worker.
    ///
    /// The engine never nudges the agent on its own; the decision loop asks
    /// this to decide whether to request an action between events.
    pub fn actions_available(&self) -> bool {
        if self.frontier.is_empty() {
            return false;
        }
        self.available_workers().any(|worker| {
            self.frontier_ops().any(|op| {
                self.operation(op)
                    .is_some_and(|operation| worker.can_assign(operation))
            })
        })
    }

    /// Number of available workers that could run tasks of `op`.
    pub fn compatible_available_workers(&self, op: OpId) -> usize {
        let Some(operation) = self.operation(op) else {
            return 0;
        };
        self.available_workers()
            .filter(|w| w.can_assign(operation))
            .count()
    }

    /// Build the operation/parallelism mask for the current state.
    pub fn action_mask(&self) -> ActionMask {
        // frontier_ops() iterates a BTreeSet, so `ops` comes out sorted.
        let ops: Vec<OpId> = self
            .frontier_ops()
            .filter(|&op| self.compatible_available_workers(op) > 0)
            .collect();
        let max_workers = if ops.is_empty() {
            0
        } else {
            self.available_workers().count()
        };
        ActionMask { ops, max_workers }
    }
}
