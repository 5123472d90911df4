// src/engine/audit.rs

//! Whole-state invariant checker.
//!
//! Re-derives the frontier, saturation, conservation and worker-exclusivity
//! properties from scratch and compares them with the engine's incremental
//! bookkeeping. This is O(entities), so the engine does not call it on its
//! own; tests and debugging harnesses call it between steps.

use std::collections::HashMap;

use thiserror::Error;

use crate::dag::{OpState, TaskState};
use crate::engine::core::SimulationEngine;
use crate::engine::worker::WorkerState;
use crate::types::{OpId, TaskId, WorkerId};

#[derive(Error, Debug, Clone, PartialEq)]
#[error("invariant violated: {0}")]
pub struct InvariantViolation(pub String);

/// Check every structural invariant of `engine`, returning all violations.
pub fn audit(engine: &SimulationEngine) -> Result<(), Vec<InvariantViolation>> {
    let mut violations = Vec::new();
    let mut fail = |msg: String| violations.push(InvariantViolation(msg));

    let mut bound: HashMap<WorkerId, (OpId, TaskId)> = HashMap::new();

    let mut job_ids: Vec<_> = engine.jobs.keys().copied().collect();
    job_ids.sort_unstable();

    for job_id in job_ids {
        let job = &engine.jobs[&job_id];

        for op in job.ops() {
            let id = op.id();

            // Conservation.
            let accounted = op.remaining_count() + op.processing_count() + op.completed_count();
            if accounted != op.num_tasks() {
                fail(format!(
                    "operation {id}: {accounted} tasks accounted for, {} exist",
                    op.num_tasks()
                ));
            }
            if op.is_complete() != (op.completed_count() == op.num_tasks()) {
                fail(format!("operation {id}: completion flag disagrees with task counts"));
            }

            // Task states and worker references.
            for task_id in op.processing_tasks() {
                let task = op.task(task_id);
                if task.state != TaskState::Assigned {
                    fail(format!("task {id}/{task_id} processing but {:?}", task.state));
                }
                match task.worker {
                    Some(w) => {
                        if let Some(prev) = bound.insert(w, (id, task_id)) {
                            fail(format!(
                                "worker {w} bound to both {}/{} and {id}/{task_id}",
                                prev.0, prev.1
                            ));
                        }
                    }
                    None => fail(format!("task {id}/{task_id} processing without a worker")),
                }
            }
            for task_id in op.remaining_tasks() {
                if op.task(task_id).state != TaskState::Idle {
                    fail(format!("task {id}/{task_id} remaining but not idle"));
                }
            }
            for task_id in op.completed_tasks() {
                if op.task(task_id).state != TaskState::Completed {
                    fail(format!("task {id}/{task_id} completed set mismatch"));
                }
            }

            // Frontier correctness, re-derived from the DAG.
            let ready = job.dependencies_satisfied(id.index) && !op.is_complete();
            let expect_frontier = ready && !op.is_saturated();
            let expect_saturated = ready && op.is_saturated();
            if engine.frontier.contains(&id) != expect_frontier {
                fail(format!(
                    "operation {id}: frontier membership {} expected {expect_frontier}",
                    engine.frontier.contains(&id)
                ));
            }
            if engine.saturated.contains(&id) != expect_saturated {
                fail(format!(
                    "operation {id}: saturated membership {} expected {expect_saturated}",
                    engine.saturated.contains(&id)
                ));
            }
            let expect_state = if op.is_complete() {
                OpState::Completed
            } else if expect_saturated {
                OpState::Saturated
            } else if expect_frontier {
                OpState::Frontier
            } else {
                OpState::Waiting
            };
            if op.state() != expect_state {
                fail(format!(
                    "operation {id}: state {:?} expected {expect_state:?}",
                    op.state()
                ));
            }
            let in_job_frontier = job.frontier_ops().any(|i| i == id.index);
            if in_job_frontier != expect_frontier {
                fail(format!("operation {id}: job frontier disagrees with engine frontier"));
            }
        }

        if job.is_complete() != job.completion_time().is_some() {
            fail(format!("job {job_id}: completion time disagrees with active ops"));
        }
        if job.is_complete() != engine.completed_jobs.contains(&job_id) {
            fail(format!("job {job_id}: completed-jobs list disagrees with job state"));
        }
        if !job.is_complete() && !engine.active_jobs.contains(&job_id) {
            fail(format!("job {job_id}: incomplete but not active"));
        }
        if job.is_complete() && job.local_workers().next().is_some() {
            fail(format!("job {job_id}: completed but still holds local workers"));
        }
    }

    for op in engine.frontier.iter().chain(engine.saturated.iter()) {
        if !engine.jobs.contains_key(&op.job) {
            fail(format!("operation {op} tracked for a job that never arrived"));
        }
    }

    // Worker exclusivity and locality.
    for worker in &engine.workers {
        let w = worker.id();
        let local_to: Vec<_> = engine
            .jobs
            .values()
            .filter(|j| j.has_local_worker(w))
            .map(|j| j.id())
            .collect();
        if local_to.len() > 1 {
            fail(format!("worker {w} local to several jobs: {local_to:?}"));
        }
        if local_to.first().copied() != worker.job() {
            fail(format!(
                "worker {w}: job field {:?} but local to {local_to:?}",
                worker.job()
            ));
        }

        match worker.state() {
            WorkerState::Bound { op, task } => {
                if bound.get(&w) != Some(&(op, task)) {
                    fail(format!("worker {w} claims {op}/{task} but no task agrees"));
                }
                if worker.job() != Some(op.job) {
                    fail(format!("worker {w} bound to {op} outside its job"));
                }
            }
            WorkerState::Moving { .. } | WorkerState::Idle => {
                if bound.contains_key(&w) {
                    fail(format!("worker {w} referenced by a task while {:?}", worker.state()));
                }
            }
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}
