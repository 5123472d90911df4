// src/engine/core.rs

//! The simulation engine: reset, step, and action application.
//!
//! The engine owns every entity of an episode (jobs, workers, timeline) and
//! refers between them with plain ids, so independent engines can run side by
//! side without sharing anything.
//!
//! Its implicit phases are:
//! - awaiting the first event (after `reset`)
//! - draining the timeline (inside `step`)
//! - awaiting an agent decision (between `step` calls)
//! - terminated (`done` was reported)

use std::collections::{BTreeSet, HashMap};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace, warn};

use crate::dag::{Job, Operation, Wave};
use crate::engine::timeline::Timeline;
use crate::engine::worker::Worker;
use crate::engine::{EngineOptions, Event, StepResult};
use crate::errors::{DagSchedError, Result};
use crate::types::{Action, JobId, OpId, TransitMode, WorkerId};

#[derive(Debug)]
pub struct SimulationEngine {
    pub(super) options: EngineOptions,
    pub(super) timeline: Timeline,
    pub(super) workers: Vec<Worker>,
    pub(super) jobs: HashMap<JobId, Job>,
    /// Jobs in the system, in arrival order.
    pub(super) active_jobs: Vec<JobId>,
    /// Finished jobs, in completion order.
    pub(super) completed_jobs: Vec<JobId>,
    /// `completed_jobs[reward_cursor..]` finished since the last reward was
    /// computed and still owe their final slice of time.
    pub(super) reward_cursor: usize,
    /// Ready operations with unassigned tasks, across all jobs.
    pub(super) frontier: BTreeSet<OpId>,
    /// Operations with every task assigned but not all completed.
    pub(super) saturated: BTreeSet<OpId>,
    pub(super) wall_time: f64,
    pub(super) rng: StdRng,
    pub(super) next_transit_token: u64,
    pub(super) truncated: bool,
}

impl SimulationEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            timeline: Timeline::new(),
            workers: Vec::new(),
            jobs: HashMap::new(),
            active_jobs: Vec::new(),
            completed_jobs: Vec::new(),
            reward_cursor: 0,
            frontier: BTreeSet::new(),
            saturated: BTreeSet::new(),
            wall_time: 0.0,
            rng: StdRng::seed_from_u64(options.seed),
            next_transit_token: 0,
            truncated: false,
        }
    }

    /// Start a new episode from a pre-seeded timeline and a worker pool.
    ///
    /// All previous episode state is dropped; the RNG is re-seeded from the
    /// options so identical inputs replay identically. Worker ids must be
    /// `0..workers.len()` in order; otherwise the engine is left untouched and
    /// a `ConfigError` is returned.
    pub fn reset(&mut self, timeline: Timeline, mut workers: Vec<Worker>) -> Result<()> {
        if let Some((index, worker)) = workers
            .iter()
            .enumerate()
            .find(|(index, worker)| worker.id() != *index)
        {
            return Err(DagSchedError::ConfigError(format!(
                "worker at position {index} has id {}; ids must be 0..{}",
                worker.id(),
                workers.len()
            )));
        }
        for worker in &mut workers {
            worker.reset();
        }

        self.timeline = timeline;
        self.workers = workers;
        self.jobs.clear();
        self.active_jobs.clear();
        self.completed_jobs.clear();
        self.reward_cursor = 0;
        self.frontier.clear();
        self.saturated.clear();
        self.wall_time = 0.0;
        self.rng = StdRng::seed_from_u64(self.options.seed);
        self.next_transit_token = 0;
        self.truncated = false;

        debug!(
            pending_events = self.timeline.len(),
            workers = self.workers.len(),
            "engine reset"
        );
        Ok(())
    }

    /// Apply `action` (if any), then advance the simulation until an event
    /// needs the agent or nothing is left to process.
    pub fn step(&mut self, action: Option<Action>) -> Result<StepResult> {
        if self.truncated {
            return Ok(StepResult {
                reward: 0.0,
                done: true,
            });
        }

        if let Some(action) = action {
            self.validate_action(&action)?;
            self.apply_action(action);
        }

        let prev_time = self.wall_time;
        let mut needs_agent = false;

        while !needs_agent {
            let Some(next_time) = self.timeline.peek_time() else {
                break;
            };
            if let Some(limit) = self.options.max_wall_time {
                if next_time > limit {
                    self.truncate(limit);
                    break;
                }
            }

            let (time, event) = self.timeline.pop()?;
            debug_assert!(
                time >= self.wall_time,
                "event at {time} popped after wall time {}",
                self.wall_time
            );
            self.wall_time = time;
            needs_agent = self.process_event(event);
        }

        let reward = self.calculate_reward(prev_time);
        let done = self.is_done();
        Ok(StepResult { reward, done })
    }

    fn process_event(&mut self, event: Event) -> bool {
        trace!(wall_time = self.wall_time, kind = event.kind(), "processing event");
        match event {
            Event::JobArrival { job } => self.handle_job_arrival(*job),
            Event::WorkerArrival { worker, op, token } => {
                self.handle_worker_arrival(worker, op, token)
            }
            Event::TaskCompletion { op, task } => self.handle_task_completion(op, task),
        }
    }

    fn validate_action(&self, action: &Action) -> Result<()> {
        let op = action.op;
        let job = self.jobs.get(&op.job).ok_or_else(|| DagSchedError::InvalidAction {
            op,
            reason: format!("job {} is not in the system", op.job),
        })?;
        if job.op(op.index).is_none() {
            return Err(DagSchedError::InvalidAction {
                op,
                reason: format!("job {} has no operation {}", op.job, op.index),
            });
        }
        if !self.frontier.contains(&op) {
            return Err(DagSchedError::InvalidAction {
                op,
                reason: "operation is not in the frontier".to_string(),
            });
        }
        Ok(())
    }

    /// Send up to `action.workers` compatible available workers toward the
    /// operation's job.
    ///
    /// Workers already local to the job start immediately, but only while the
    /// operation has unassigned tasks. Any other idle worker is dispatched and
    /// pays the transit delay; if the operation saturates before it arrives it
    /// idles at the job.
    fn apply_action(&mut self, action: Action) {
        let op_id = action.op;
        let job = &self.jobs[&op_id.job];
        let op = &job.ops()[op_id.index];

        let local: Vec<WorkerId> = job
            .local_workers()
            .filter(|&w| self.workers[w].is_available() && self.workers[w].can_assign(op))
            .take(action.workers)
            .collect();
        let bindable = local.len().min(op.remaining_count());
        let remote: Vec<WorkerId> = self
            .workers
            .iter()
            .filter(|w| w.is_available() && w.job() != Some(op_id.job) && w.can_assign(op))
            .map(|w| w.id())
            .take(action.workers - local.len())
            .collect();

        debug!(
            op = %op_id,
            requested = action.workers,
            local = bindable,
            remote = remote.len(),
            "applying action"
        );

        for &worker in &local[..bindable] {
            self.bind_worker(worker, op_id, Wave::First);
        }
        for worker in remote {
            self.send_worker(worker, op_id);
        }
    }

    /// Bind an idle worker that is local to `op_id`'s job to its next task
    /// and schedule the completion.
    pub(super) fn bind_worker(&mut self, worker: WorkerId, op_id: OpId, wave: Wave) {
        let now = self.wall_time;
        let worker_type = self.workers[worker].worker_type();
        let job = self
            .jobs
            .get_mut(&op_id.job)
            .expect("bound worker's job must be registered");
        let (task, duration, saturated) =
            job.assign_worker(op_id.index, worker, worker_type, wave, now, &mut self.rng);
        self.workers[worker].bind(op_id, task);

        if saturated {
            self.frontier.remove(&op_id);
            self.saturated.insert(op_id);
        }

        debug!(worker, op = %op_id, task, duration, ?wave, "worker bound to task");
        self.timeline
            .push(now + duration, Event::TaskCompletion { op: op_id, task });
    }

    /// Move an idle worker toward `op_id`'s job.
    fn send_worker(&mut self, worker: WorkerId, op_id: OpId) {
        if let Some(old_job) = self.workers[worker].job() {
            if let Some(job) = self.jobs.get_mut(&old_job) {
                job.remove_local_worker(worker);
            }
        }

        let token = self.next_transit_token;
        self.next_transit_token += 1;
        self.workers[worker].start_transit(op_id, token);

        let delay = self.sample_transit_delay();
        debug!(worker, op = %op_id, delay, "worker dispatched");
        self.timeline.push(
            self.wall_time + delay,
            Event::WorkerArrival {
                worker,
                op: op_id,
                token,
            },
        );
    }

    /// Never negative, so arrivals cannot land before the current wall time.
    fn sample_transit_delay(&mut self) -> f64 {
        let mean = self.options.moving_cost;
        if !mean.is_finite() || mean <= 0.0 {
            return 0.0;
        }
        match self.options.transit {
            TransitMode::Constant => mean,
            TransitMode::Exponential => {
                // Inverse-CDF sampling; 1 - u lies in (0, 1].
                let u: f64 = self.rng.gen_range(0.0..1.0);
                -mean * (1.0 - u).ln()
            }
        }
    }

    fn truncate(&mut self, limit: f64) {
        warn!(
            wall_time = self.wall_time,
            limit,
            pending_events = self.timeline.len(),
            "wall-time bound reached; truncating episode"
        );
        self.wall_time = self.wall_time.max(limit);
        self.truncated = true;
    }

    /// Negative scaled job-time accrued in `(prev_time, wall_time]`.
    ///
    /// Jobs that finished during this window count up to their completion
    /// instant only.
    fn calculate_reward(&mut self, prev_time: f64) -> f64 {
        let finished = &self.completed_jobs[self.reward_cursor..];
        let mut total = 0.0;
        for id in self.active_jobs.iter().chain(finished.iter()) {
            let job = &self.jobs[id];
            let start = job.arrival_time().max(prev_time);
            let end = job
                .completion_time()
                .unwrap_or(f64::INFINITY)
                .min(self.wall_time);
            if end > start {
                total += end - start;
            }
        }
        self.reward_cursor = self.completed_jobs.len();
        -self.options.reward_scale * total
    }

    fn is_done(&self) -> bool {
        if self.truncated {
            return true;
        }
        self.timeline.is_empty()
            && self.workers.iter().all(Worker::is_available)
            && !self.actions_available()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn wall_time(&self) -> f64 {
        self.wall_time
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn pending_events(&self) -> usize {
        self.timeline.len()
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    pub fn worker(&self, id: WorkerId) -> Option<&Worker> {
        self.workers.get(id)
    }

    pub fn available_workers(&self) -> impl Iterator<Item = &Worker> {
        self.workers.iter().filter(|w| w.is_available())
    }

    pub fn job(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    pub fn operation(&self, op: OpId) -> Option<&Operation> {
        self.jobs.get(&op.job)?.op(op.index)
    }

    /// Every job that has arrived so far, in no particular order.
    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    pub fn active_jobs(&self) -> &[JobId] {
        &self.active_jobs
    }

    pub fn completed_jobs(&self) -> &[JobId] {
        &self.completed_jobs
    }

    pub fn num_seen_jobs(&self) -> usize {
        self.active_jobs.len() + self.completed_jobs.len()
    }

    pub fn all_jobs_complete(&self) -> bool {
        self.active_jobs.is_empty()
    }

    pub fn frontier_ops(&self) -> impl Iterator<Item = OpId> + '_ {
        self.frontier.iter().copied()
    }

    pub fn saturated_ops(&self) -> impl Iterator<Item = OpId> + '_ {
        self.saturated.iter().copied()
    }

    pub fn is_in_frontier(&self, op: OpId) -> bool {
        self.frontier.contains(&op)
    }

    /// Mean time from arrival to completion over finished jobs.
    pub fn mean_job_duration(&self) -> Option<f64> {
        if self.completed_jobs.is_empty() {
            return None;
        }
        let total: f64 = self
            .completed_jobs
            .iter()
            .filter_map(|id| self.jobs[id].sojourn_time())
            .sum();
        Some(total / self.completed_jobs.len() as f64)
    }
}
