// src/engine/worker.rs

//! Worker state machine.
//!
//! | from   | to     | trigger                                   |
//! |--------|--------|-------------------------------------------|
//! | Idle   | Moving | dispatched toward another job             |
//! | Moving | Idle   | arrived, target op saturated or complete  |
//! | Moving | Idle   | arrived at a job that already completed   |
//! | Moving | Bound  | arrived, bound to a task on arrival       |
//! | Idle   | Bound  | bound to a task of its current job        |
//! | Bound  | Bound  | task done, next task of the same op       |
//! | Bound  | Idle   | task done, op has nothing left to assign  |

use crate::dag::Operation;
use crate::types::{JobId, OpId, TaskId, WorkerId, WorkerType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Moving { to: OpId, token: u64 },
    Bound { op: OpId, task: TaskId },
}

#[derive(Debug, Clone)]
pub struct Worker {
    id: WorkerId,
    worker_type: WorkerType,
    /// Job this worker is local to; `None` before its first arrival, while in
    /// transit, and once its job has completed.
    job: Option<JobId>,
    state: WorkerState,
}

impl Worker {
    pub fn new(id: WorkerId, worker_type: WorkerType) -> Self {
        Self {
            id,
            worker_type,
            job: None,
            state: WorkerState::Idle,
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    pub fn worker_type(&self) -> WorkerType {
        self.worker_type
    }

    pub fn job(&self) -> Option<JobId> {
        self.job
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Not bound to a task and not moving.
    pub fn is_available(&self) -> bool {
        self.state == WorkerState::Idle
    }

    pub fn is_moving(&self) -> bool {
        matches!(self.state, WorkerState::Moving { .. })
    }

    pub fn current_task(&self) -> Option<(OpId, TaskId)> {
        match self.state {
            WorkerState::Bound { op, task } => Some((op, task)),
            _ => None,
        }
    }

    pub fn transit_token(&self) -> Option<u64> {
        match self.state {
            WorkerState::Moving { token, .. } => Some(token),
            _ => None,
        }
    }

    pub fn can_assign(&self, op: &Operation) -> bool {
        op.supports(self.worker_type)
    }

    /// Forget all episode state; identity and type persist.
    pub fn reset(&mut self) {
        self.job = None;
        self.state = WorkerState::Idle;
    }

    pub(crate) fn start_transit(&mut self, to: OpId, token: u64) {
        assert!(self.is_available(), "worker {} dispatched while {:?}", self.id, self.state);
        self.job = None;
        self.state = WorkerState::Moving { to, token };
    }

    /// End the transit. `job` is `None` when the target job finished while
    /// the worker was on its way.
    pub(crate) fn arrive(&mut self, job: Option<JobId>) {
        assert!(self.is_moving(), "worker {} arrived while {:?}", self.id, self.state);
        self.job = job;
        self.state = WorkerState::Idle;
    }

    /// Detach an idle worker from its completed job.
    pub(crate) fn leave_job(&mut self) {
        assert!(self.is_available(), "worker {} left its job while {:?}", self.id, self.state);
        self.job = None;
    }

    pub(crate) fn bind(&mut self, op: OpId, task: TaskId) {
        assert!(self.is_available(), "worker {} bound while {:?}", self.id, self.state);
        debug_assert_eq!(self.job, Some(op.job), "worker {} bound outside its job", self.id);
        self.state = WorkerState::Bound { op, task };
    }

    pub(crate) fn release(&mut self) -> (OpId, TaskId) {
        match self.state {
            WorkerState::Bound { op, task } => {
                self.state = WorkerState::Idle;
                (op, task)
            }
            other => panic!("worker {} released while {:?}", self.id, other),
        }
    }
}
