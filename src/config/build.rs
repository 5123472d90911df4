// src/config/build.rs

//! Validated workload → engine inputs.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::model::{DurationConfig, JobConfig, WorkloadFile};
use crate::dag::{DurationModel, EmpiricalDurations, FixedDurations, Job, JobDag, Operation};
use crate::engine::{EngineOptions, SimulationEngine, Timeline, Worker};
use crate::errors::Result;
use crate::types::{JobId, OpId};

/// Engine options from `[config]`.
pub fn engine_options(cfg: &WorkloadFile) -> EngineOptions {
    let c = &cfg.config;
    EngineOptions {
        reward_scale: c.reward_scale,
        moving_cost: c.moving_cost,
        transit: c.transit,
        max_wall_time: c.max_wall_time,
        seed: c.seed,
    }
}

/// One worker per unit of every `[[workers]]` group, numbered in file order.
pub fn build_workers(cfg: &WorkloadFile) -> Vec<Worker> {
    cfg.workers
        .iter()
        .flat_map(|g| std::iter::repeat_n(g.worker_type, g.count))
        .enumerate()
        .map(|(id, worker_type)| Worker::new(id, worker_type))
        .collect()
}

/// Every job with its arrival time; job ids follow file order.
pub fn build_jobs(cfg: &WorkloadFile) -> Vec<(f64, Job)> {
    cfg.job
        .iter()
        .enumerate()
        .map(|(id, job)| (job.arrival_time, build_job(id, job)))
        .collect()
}

fn build_job(id: JobId, cfg: &JobConfig) -> Job {
    let index_of: BTreeMap<&str, usize> = cfg
        .op
        .keys()
        .enumerate()
        .map(|(index, name)| (name.as_str(), index))
        .collect();

    let deps: Vec<Vec<usize>> = cfg
        .op
        .values()
        .map(|op| op.after.iter().map(|dep| index_of[dep.as_str()]).collect())
        .collect();

    let ops: Vec<Operation> = cfg
        .op
        .values()
        .enumerate()
        .map(|(index, op)| {
            Operation::new(OpId::new(id, index), op.num_tasks, duration_model(&op.duration))
        })
        .collect();

    debug!(job = id, ops = ?index_of, "built job");
    Job::new(id, cfg.arrival_time, ops, JobDag::from_dependencies(&deps))
}

fn duration_model(cfg: &DurationConfig) -> Arc<dyn DurationModel> {
    match cfg {
        DurationConfig::Fixed(per_type) => Arc::new(FixedDurations::new(per_type.clone())),
        DurationConfig::Empirical(per_type) => Arc::new(EmpiricalDurations::new(per_type.clone())),
    }
}

/// Timeline pre-seeded with every job arrival.
pub fn initial_timeline(cfg: &WorkloadFile) -> Timeline {
    Timeline::from_arrivals(build_jobs(cfg))
}

/// A reset engine for `cfg` using `options`.
pub fn build_engine(cfg: &WorkloadFile, options: EngineOptions) -> Result<SimulationEngine> {
    let mut engine = SimulationEngine::new(options);
    engine.reset(initial_timeline(cfg), build_workers(cfg))?;
    Ok(engine)
}
