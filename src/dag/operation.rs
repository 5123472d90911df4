// src/dag/operation.rs

//! Operations (DAG nodes) and the tasks they are split into.
//!
//! Operation lifecycle, driven only by the engine:
//!
//! | from      | to        | trigger                                         |
//! |-----------|-----------|-------------------------------------------------|
//! | Waiting   | Frontier  | job arrived (source op) or last predecessor done |
//! | Frontier  | Saturated | last remaining task handed to a worker          |
//! | Saturated | Completed | last processing task finished                   |
//!
//! Tasks move `Idle -> Assigned -> Completed` and never leave their operation.

use std::collections::BTreeSet;
use std::sync::Arc;

use rand::rngs::StdRng;

use crate::dag::duration::{DurationModel, Wave};
use crate::types::{JobId, OpId, TaskId, WorkerId, WorkerType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Assigned,
    Completed,
}

/// Atomic unit of work; run by at most one worker.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub op: OpId,
    pub state: TaskState,
    pub worker: Option<WorkerId>,
    pub accepted_at: Option<f64>,
    pub completed_at: Option<f64>,
}

impl Task {
    fn new(id: TaskId, op: OpId) -> Self {
        Self {
            id,
            op,
            state: TaskState::Idle,
            worker: None,
            accepted_at: None,
            completed_at: None,
        }
    }

    pub fn job_id(&self) -> JobId {
        self.op.job
    }
}

/// Where an operation stands in its job's dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpState {
    /// Some predecessor has not completed yet.
    Waiting,
    /// Dependencies satisfied and tasks still unassigned.
    Frontier,
    /// Every task is assigned; some are still processing.
    Saturated,
    /// Every task has completed. Terminal.
    Completed,
}

#[derive(Debug, Clone)]
pub struct Operation {
    id: OpId,
    state: OpState,
    tasks: Vec<Task>,
    /// Unassigned tasks; popped from the back, so task 0 is handed out first.
    remaining: Vec<TaskId>,
    processing: BTreeSet<TaskId>,
    completed: BTreeSet<TaskId>,
    durations: Arc<dyn DurationModel>,
}

impl Operation {
    pub fn new(id: OpId, num_tasks: usize, durations: Arc<dyn DurationModel>) -> Self {
        assert!(num_tasks > 0, "operation {id} must have at least one task");
        Self {
            id,
            state: OpState::Waiting,
            tasks: (0..num_tasks).map(|t| Task::new(t, id)).collect(),
            remaining: (0..num_tasks).rev().collect(),
            processing: BTreeSet::new(),
            completed: BTreeSet::new(),
            durations,
        }
    }

    pub fn id(&self) -> OpId {
        self.id
    }

    pub fn state(&self) -> OpState {
        self.state
    }

    pub fn num_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_complete(&self) -> bool {
        self.state == OpState::Completed
    }

    /// All tasks are at least assigned.
    pub fn is_saturated(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn remaining_count(&self) -> usize {
        self.remaining.len()
    }

    pub fn processing_count(&self) -> usize {
        self.processing.len()
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    pub fn remaining_tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.remaining.iter().rev().copied()
    }

    pub fn processing_tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.processing.iter().copied()
    }

    pub fn completed_tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.completed.iter().copied()
    }

    pub fn task(&self, task: TaskId) -> &Task {
        &self.tasks[task]
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn durations(&self) -> &Arc<dyn DurationModel> {
        &self.durations
    }

    pub fn supports(&self, worker_type: WorkerType) -> bool {
        self.durations.supports(worker_type)
    }

    /// Waiting -> Frontier. Returns `false` if the operation was already past
    /// `Waiting`, so repeated frontier updates are harmless.
    pub fn enter_frontier(&mut self) -> bool {
        if self.state != OpState::Waiting {
            return false;
        }
        self.state = OpState::Frontier;
        true
    }

    /// Bind `worker` to the next remaining task at time `now`.
    ///
    /// Returns the task and its sampled duration. The caller must have checked
    /// that the operation is in the frontier and supports the worker type.
    pub fn assign(
        &mut self,
        worker: WorkerId,
        worker_type: WorkerType,
        wave: Wave,
        now: f64,
        rng: &mut StdRng,
    ) -> (TaskId, f64) {
        assert_eq!(
            self.state,
            OpState::Frontier,
            "cannot assign worker {worker} to operation {} in state {:?}",
            self.id,
            self.state
        );
        let duration = self
            .durations
            .sample(worker_type, wave, rng)
            .unwrap_or_else(|| {
                panic!(
                    "worker type {worker_type} is incompatible with operation {}",
                    self.id
                )
            });
        let task_id = self
            .remaining
            .pop()
            .expect("frontier operation must have a remaining task");

        let task = &mut self.tasks[task_id];
        debug_assert_eq!(task.state, TaskState::Idle);
        task.state = TaskState::Assigned;
        task.worker = Some(worker);
        task.accepted_at = Some(now);
        self.processing.insert(task_id);

        if self.remaining.is_empty() {
            self.state = OpState::Saturated;
        }

        (task_id, duration)
    }

    /// Mark a processing task as completed. Returns `true` if this completed
    /// the whole operation.
    pub fn complete_task(&mut self, task_id: TaskId, now: f64) -> bool {
        assert!(
            self.processing.remove(&task_id),
            "task {task_id} of operation {} is not processing",
            self.id
        );
        let task = &mut self.tasks[task_id];
        task.state = TaskState::Completed;
        task.completed_at = Some(now);
        self.completed.insert(task_id);

        if self.completed.len() == self.tasks.len() {
            debug_assert_eq!(self.state, OpState::Saturated);
            self.state = OpState::Completed;
            true
        } else {
            false
        }
    }
}
