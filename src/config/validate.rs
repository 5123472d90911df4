// src/config/validate.rs

use std::collections::BTreeSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{JobConfig, RawWorkloadFile, WorkloadFile};
use crate::errors::{DagSchedError, Result};
use crate::types::WorkerType;

impl TryFrom<RawWorkloadFile> for WorkloadFile {
    type Error = DagSchedError;

    fn try_from(raw: RawWorkloadFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_workload(&raw)?;
        Ok(WorkloadFile::new_unchecked(raw.config, raw.workers, raw.job))
    }
}

fn validate_raw_workload(cfg: &RawWorkloadFile) -> Result<()> {
    ensure_has_jobs(cfg)?;
    ensure_has_workers(cfg)?;
    validate_global_config(cfg)?;

    let worker_types: BTreeSet<WorkerType> = cfg.workers.iter().map(|g| g.worker_type).collect();
    for (id, job) in cfg.job.iter().enumerate() {
        validate_job(id, job)?;
        validate_job_dependencies(id, job)?;
        validate_dag(id, job)?;
        validate_compatibility(id, job, &worker_types)?;
    }
    Ok(())
}

fn ensure_has_jobs(cfg: &RawWorkloadFile) -> Result<()> {
    if cfg.job.is_empty() {
        return Err(DagSchedError::ConfigError(
            "workload must contain at least one [[job]] section".to_string(),
        ));
    }
    Ok(())
}

fn ensure_has_workers(cfg: &RawWorkloadFile) -> Result<()> {
    if cfg.workers.is_empty() {
        return Err(DagSchedError::ConfigError(
            "workload must contain at least one [[workers]] section".to_string(),
        ));
    }
    if let Some(index) = cfg.workers.iter().position(|g| g.count == 0) {
        return Err(DagSchedError::ConfigError(format!(
            "[[workers]] entry {index} has count = 0"
        )));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawWorkloadFile) -> Result<()> {
    let c = &cfg.config;

    if !(c.reward_scale.is_finite() && c.reward_scale > 0.0) {
        return Err(DagSchedError::ConfigError(format!(
            "[config].reward_scale must be a positive number (got {})",
            c.reward_scale
        )));
    }
    if !(c.moving_cost.is_finite() && c.moving_cost >= 0.0) {
        return Err(DagSchedError::ConfigError(format!(
            "[config].moving_cost must be >= 0 (got {})",
            c.moving_cost
        )));
    }
    if let Some(limit) = c.max_wall_time {
        if !(limit.is_finite() && limit > 0.0) {
            return Err(DagSchedError::ConfigError(format!(
                "[config].max_wall_time must be a positive number (got {limit})"
            )));
        }
    }
    Ok(())
}

fn validate_job(id: usize, job: &JobConfig) -> Result<()> {
    if !(job.arrival_time.is_finite() && job.arrival_time >= 0.0) {
        return Err(DagSchedError::ConfigError(format!(
            "job {id} has invalid arrival_time {}",
            job.arrival_time
        )));
    }
    if job.op.is_empty() {
        return Err(DagSchedError::ConfigError(format!(
            "job {id} must contain at least one [job.op.<name>] section"
        )));
    }
    for (name, op) in job.op.iter() {
        if op.num_tasks == 0 {
            return Err(DagSchedError::ConfigError(format!(
                "job {id}: operation '{name}' has num_tasks = 0"
            )));
        }
        if let Some(bad) = op.duration.values().find(|d| !(d.is_finite() && *d > 0.0)) {
            return Err(DagSchedError::ConfigError(format!(
                "job {id}: operation '{name}' has invalid duration {bad}"
            )));
        }
    }
    Ok(())
}

fn validate_job_dependencies(id: usize, job: &JobConfig) -> Result<()> {
    for (name, op) in job.op.iter() {
        for dep in op.after.iter() {
            if dep == name {
                return Err(DagSchedError::ConfigError(format!(
                    "job {id}: operation '{name}' cannot depend on itself in `after`"
                )));
            }
            if !job.op.contains_key(dep) {
                return Err(DagSchedError::ConfigError(format!(
                    "job {id}: operation '{name}' has unknown dependency '{dep}' in `after`"
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(id: usize, job: &JobConfig) -> Result<()> {
    // Edge direction: dep -> op.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in job.op.keys() {
        graph.add_node(name.as_str());
    }
    for (name, op) in job.op.iter() {
        for dep in op.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(DagSchedError::DagCycle(format!(
            "job {id}: cycle involving operation '{}'",
            cycle.node_id()
        ))),
    }
}

fn validate_compatibility(id: usize, job: &JobConfig, worker_types: &BTreeSet<WorkerType>) -> Result<()> {
    for (name, op) in job.op.iter() {
        if !worker_types.iter().any(|&t| op.duration.supports(t)) {
            return Err(DagSchedError::ConfigError(format!(
                "job {id}: no configured worker type can run operation '{name}' \
                 (worker types: {worker_types:?})"
            )));
        }
    }
    Ok(())
}
