// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::dag::WaveSamples;
use crate::types::{TransitMode, WorkerType};

/// Workload file exactly as deserialized from TOML.
///
/// ```toml
/// [config]
/// moving_cost = 2000.0
/// transit = "constant"
///
/// [[workers]]
/// count = 4
///
/// [[job]]
/// arrival_time = 0.0
/// [job.op.scan]
/// num_tasks = 2
/// duration = { fixed = [100.0] }
/// [job.op.join]
/// num_tasks = 1
/// after = ["scan"]
/// duration = { fixed = [50.0] }
/// ```
///
/// Nothing here has been checked; see [`WorkloadFile`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWorkloadFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Worker pool, as groups of identical workers.
    #[serde(default)]
    pub workers: Vec<WorkerGroup>,

    /// Jobs in file order; a job's id is its position here.
    #[serde(default)]
    pub job: Vec<JobConfig>,
}

/// A workload that passed validation.
///
/// Only constructible through `TryFrom<RawWorkloadFile>`.
#[derive(Debug, Clone)]
pub struct WorkloadFile {
    pub config: ConfigSection,
    pub workers: Vec<WorkerGroup>,
    pub job: Vec<JobConfig>,
}

impl WorkloadFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        workers: Vec<WorkerGroup>,
        job: Vec<JobConfig>,
    ) -> Self {
        Self {
            config,
            workers,
            job,
        }
    }

    pub fn num_workers(&self) -> usize {
        self.workers.iter().map(|g| g.count).sum()
    }

    pub fn num_tasks(&self) -> usize {
        self.job
            .iter()
            .flat_map(|j| j.op.values())
            .map(|op| op.num_tasks)
            .sum()
    }
}

/// `[config]` section: engine parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConfigSection {
    #[serde(default = "default_reward_scale")]
    pub reward_scale: f64,

    /// Mean (exponential) or exact (constant) transit delay.
    #[serde(default = "default_moving_cost")]
    pub moving_cost: f64,

    #[serde(default)]
    pub transit: TransitMode,

    #[serde(default)]
    pub max_wall_time: Option<f64>,

    #[serde(default)]
    pub seed: u64,
}

fn default_reward_scale() -> f64 {
    1e-5
}

fn default_moving_cost() -> f64 {
    2000.0
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            reward_scale: default_reward_scale(),
            moving_cost: default_moving_cost(),
            transit: TransitMode::default(),
            max_wall_time: None,
            seed: 0,
        }
    }
}

/// `[[workers]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkerGroup {
    pub count: usize,

    #[serde(default)]
    pub worker_type: WorkerType,
}

/// `[[job]]` entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub arrival_time: f64,

    /// Operations keyed by name. Operation indices follow key order.
    #[serde(default)]
    pub op: BTreeMap<String, OpConfig>,
}

/// `[job.op.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct OpConfig {
    pub num_tasks: usize,

    /// Operations (by name, same job) that must complete first.
    #[serde(default)]
    pub after: Vec<String>,

    pub duration: DurationConfig,
}

/// Duration table of an operation, indexed by worker type.
///
/// `{ fixed = [100.0, 80.0] }` or
/// `{ empirical = [{ first_wave = [..], rest_wave = [..] }] }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationConfig {
    Fixed(Vec<f64>),
    Empirical(Vec<WaveSamples>),
}

impl DurationConfig {
    pub fn supports(&self, worker_type: WorkerType) -> bool {
        match self {
            DurationConfig::Fixed(per_type) => per_type.get(worker_type).is_some(),
            DurationConfig::Empirical(per_type) => {
                per_type.get(worker_type).is_some_and(|s| !s.is_empty())
            }
        }
    }

    pub(crate) fn values(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match self {
            DurationConfig::Fixed(per_type) => Box::new(per_type.iter().copied()),
            DurationConfig::Empirical(per_type) => Box::new(
                per_type
                    .iter()
                    .flat_map(|s| s.first_wave.iter().chain(s.rest_wave.iter()).copied()),
            ),
        }
    }
}
