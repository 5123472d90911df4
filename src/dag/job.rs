// src/dag/job.rs

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use tracing::debug;

use crate::dag::duration::Wave;
use crate::dag::graph::JobDag;
use crate::dag::operation::{OpState, Operation};
use crate::types::{JobId, OpId, TaskId, WorkerId, WorkerType};

/// A DAG of operations plus its arrival/completion bookkeeping.
///
/// Invariants maintained here:
/// - `frontier_ops ⊆ active_ops`
/// - an op is in `frontier_ops` iff it is in `OpState::Frontier`
/// - the job is complete iff `active_ops` is empty
#[derive(Debug, Clone)]
pub struct Job {
    id: JobId,
    arrival_time: f64,
    completion_time: Option<f64>,
    ops: Vec<Operation>,
    dag: JobDag,
    active_ops: BTreeSet<usize>,
    frontier_ops: BTreeSet<usize>,
    local_workers: BTreeSet<WorkerId>,
}

impl Job {
    /// Assemble a job. `ops[i].id()` must be `OpId { job: id, index: i }` and
    /// `dag` must be acyclic over exactly `ops.len()` nodes.
    pub fn new(id: JobId, arrival_time: f64, ops: Vec<Operation>, dag: JobDag) -> Self {
        assert_eq!(
            ops.len(),
            dag.num_ops(),
            "job {id}: operation list and DAG disagree on size"
        );
        for (index, op) in ops.iter().enumerate() {
            assert_eq!(op.id(), OpId::new(id, index), "job {id}: misnumbered operation");
        }
        let active_ops = (0..ops.len()).collect();
        Self {
            id,
            arrival_time,
            completion_time: None,
            ops,
            dag,
            active_ops,
            frontier_ops: BTreeSet::new(),
            local_workers: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn arrival_time(&self) -> f64 {
        self.arrival_time
    }

    pub fn completion_time(&self) -> Option<f64> {
        self.completion_time
    }

    pub fn is_complete(&self) -> bool {
        self.active_ops.is_empty()
    }

    /// Time spent in the system, if the job has completed.
    pub fn sojourn_time(&self) -> Option<f64> {
        self.completion_time.map(|t| t - self.arrival_time)
    }

    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    pub fn op(&self, index: usize) -> Option<&Operation> {
        self.ops.get(index)
    }

    pub fn dag(&self) -> &JobDag {
        &self.dag
    }

    pub fn active_ops(&self) -> impl Iterator<Item = usize> + '_ {
        self.active_ops.iter().copied()
    }

    pub fn frontier_ops(&self) -> impl Iterator<Item = usize> + '_ {
        self.frontier_ops.iter().copied()
    }

    pub fn local_workers(&self) -> impl Iterator<Item = WorkerId> + '_ {
        self.local_workers.iter().copied()
    }

    pub fn has_local_worker(&self, worker: WorkerId) -> bool {
        self.local_workers.contains(&worker)
    }

    pub fn add_local_worker(&mut self, worker: WorkerId) {
        self.local_workers.insert(worker);
    }

    pub fn remove_local_worker(&mut self, worker: WorkerId) {
        let removed = self.local_workers.remove(&worker);
        debug_assert!(removed, "worker {worker} was not local to job {}", self.id);
    }

    /// Put every source operation in the frontier. Returns their indices.
    pub fn activate(&mut self) -> Vec<usize> {
        let sources = self.dag.sources();
        for &index in &sources {
            if self.ops[index].enter_frontier() {
                self.frontier_ops.insert(index);
            }
        }
        debug!(job = self.id, ?sources, "job sources entered the frontier");
        sources
    }

    /// Whether every predecessor of `index` has completed.
    pub fn dependencies_satisfied(&self, index: usize) -> bool {
        self.dag
            .predecessors(index)
            .into_iter()
            .all(|p| self.ops[p].is_complete())
    }

    /// Bind `worker` to the next task of operation `index`.
    ///
    /// Returns the task, its duration, and whether the operation just became
    /// saturated (and so left the job's frontier).
    pub fn assign_worker(
        &mut self,
        index: usize,
        worker: WorkerId,
        worker_type: WorkerType,
        wave: Wave,
        now: f64,
        rng: &mut StdRng,
    ) -> (TaskId, f64, bool) {
        let op = &mut self.ops[index];
        let (task, duration) = op.assign(worker, worker_type, wave, now, rng);
        let saturated = op.state() == OpState::Saturated;
        if saturated {
            self.frontier_ops.remove(&index);
        }
        (task, duration, saturated)
    }

    /// Record a finished task. If that completes the operation, returns the
    /// successor operations that just became ready.
    pub fn complete_task(&mut self, index: usize, task: TaskId, now: f64) -> Option<Vec<usize>> {
        if !self.ops[index].complete_task(task, now) {
            return None;
        }

        self.active_ops.remove(&index);
        self.frontier_ops.remove(&index);

        let mut ready = Vec::new();
        for succ in self.dag.successors(index) {
            if self.dependencies_satisfied(succ) && self.ops[succ].enter_frontier() {
                self.frontier_ops.insert(succ);
                ready.push(succ);
            }
        }
        Some(ready)
    }

    /// Stamp the completion time and release every local worker, returning
    /// them. Must be called exactly once, after the last operation completes.
    pub fn mark_completed(&mut self, now: f64) -> Vec<WorkerId> {
        assert!(self.is_complete(), "job {} still has active operations", self.id);
        assert!(
            self.completion_time.is_none(),
            "job {} completed twice",
            self.id
        );
        self.completion_time = Some(now);
        std::mem::take(&mut self.local_workers).into_iter().collect()
    }
}
