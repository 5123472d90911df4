// src/engine/event_handlers.rs

//! One handler per event kind.
//!
//! Each handler returns whether the agent must be consulted before the
//! timeline is drained any further:
//!
//! | event          | needs agent                                |
//! |----------------|--------------------------------------------|
//! | JobArrival     | always                                     |
//! | WorkerArrival  | if the worker ended up idle                |
//! | TaskCompletion | if the task completed its operation        |

use tracing::{debug, info, warn};

use crate::dag::{Job, OpState, Wave};
use crate::engine::core::SimulationEngine;
use crate::types::{JobId, OpId, TaskId, WorkerId};

impl SimulationEngine {
    /// Register the job and put its source operations in the frontier.
    pub(super) fn handle_job_arrival(&mut self, mut job: Job) -> bool {
        let id = job.id();
        assert!(!self.jobs.contains_key(&id), "job {id} arrived twice");

        for index in job.activate() {
            self.frontier.insert(OpId::new(id, index));
        }

        info!(
            job = id,
            wall_time = self.wall_time,
            num_ops = job.ops().len(),
            "job arrived"
        );
        self.active_jobs.push(id);
        self.jobs.insert(id, job);
        true
    }

    /// The worker becomes local to the target job and either starts a task
    /// there or waits for a decision.
    pub(super) fn handle_worker_arrival(&mut self, worker: WorkerId, op: OpId, token: u64) -> bool {
        if self.workers[worker].transit_token() != Some(token) {
            warn!(worker, op = %op, token, "dropping superseded worker arrival");
            return false;
        }

        let job = self
            .jobs
            .get_mut(&op.job)
            .expect("worker dispatched to a job that never arrived");
        if job.is_complete() {
            self.workers[worker].arrive(None);
            debug!(worker, op = %op, "worker arrived after its job completed; idling");
            return true;
        }
        job.add_local_worker(worker);
        self.workers[worker].arrive(Some(op.job));

        let state = job.ops()[op.index].state();
        match state {
            OpState::Frontier => {
                self.bind_worker(worker, op, Wave::First);
                false
            }
            OpState::Saturated | OpState::Completed => {
                debug!(worker, op = %op, ?state, "worker arrived to a finished operation; idling");
                true
            }
            OpState::Waiting => unreachable!("worker {worker} was sent to waiting operation {op}"),
        }
    }

    /// Free the worker, advance the operation, and propagate completion to
    /// successors and the job.
    pub(super) fn handle_task_completion(&mut self, op: OpId, task: TaskId) -> bool {
        let now = self.wall_time;
        let job = self
            .jobs
            .get_mut(&op.job)
            .expect("completed task belongs to an unregistered job");
        let worker = job.ops()[op.index]
            .task(task)
            .worker
            .expect("completed task has no worker");

        let newly_ready = job.complete_task(op.index, task, now);
        let job_complete = job.is_complete();
        let continue_on_op = job.ops()[op.index].state() == OpState::Frontier;

        let released = self.workers[worker].release();
        debug_assert_eq!(released, (op, task), "worker {worker} was bound elsewhere");

        let Some(newly_ready) = newly_ready else {
            // Operation still running. The worker keeps going on it if there
            // is unassigned work; otherwise it stays idle at the job.
            if continue_on_op {
                self.bind_worker(worker, op, Wave::Rest);
            } else {
                debug!(worker, op = %op, "operation saturated; worker idle");
            }
            return false;
        };

        let was_saturated = self.saturated.remove(&op);
        debug_assert!(was_saturated, "completed operation {op} was not saturated");

        for index in &newly_ready {
            self.frontier.insert(OpId::new(op.job, *index));
        }
        debug!(op = %op, ?newly_ready, wall_time = now, "operation completed");

        if job_complete {
            self.complete_job(op.job);
        }
        true
    }

    fn complete_job(&mut self, id: JobId) {
        let now = self.wall_time;
        let job = self.jobs.get_mut(&id).expect("completing unknown job");
        let released = job.mark_completed(now);
        for &worker in &released {
            self.workers[worker].leave_job();
        }

        self.active_jobs.retain(|&j| j != id);
        self.completed_jobs.push(id);

        info!(
            job = id,
            wall_time = now,
            sojourn = now - job.arrival_time(),
            released = released.len(),
            "job completed"
        );
    }
}
