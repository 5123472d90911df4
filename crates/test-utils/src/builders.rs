#![allow(dead_code)]

use std::collections::BTreeMap;

use dagsched::config::{
    ConfigSection, DurationConfig, JobConfig, OpConfig, RawWorkloadFile, WorkerGroup,
    WorkloadFile,
};
use dagsched::dag::WaveSamples;
use dagsched::types::{TransitMode, WorkerType};

/// Builder for `WorkloadFile` to simplify test setup.
///
/// Starts from constant, zero-cost transit so timings are exact unless a
/// test opts back in.
pub struct WorkloadBuilder {
    workload: RawWorkloadFile,
}

impl WorkloadBuilder {
    pub fn new() -> Self {
        Self {
            workload: RawWorkloadFile {
                config: ConfigSection {
                    moving_cost: 0.0,
                    transit: TransitMode::Constant,
                    ..ConfigSection::default()
                },
                workers: vec![],
                job: vec![],
            },
        }
    }

    pub fn workers(mut self, count: usize) -> Self {
        self.workload.workers.push(WorkerGroup {
            count,
            worker_type: 0,
        });
        self
    }

    pub fn typed_workers(mut self, count: usize, worker_type: WorkerType) -> Self {
        self.workload.workers.push(WorkerGroup { count, worker_type });
        self
    }

    pub fn job(mut self, job: JobConfigBuilder) -> Self {
        self.workload.job.push(job.build());
        self
    }

    pub fn reward_scale(mut self, scale: f64) -> Self {
        self.workload.config.reward_scale = scale;
        self
    }

    pub fn moving_cost(mut self, cost: f64) -> Self {
        self.workload.config.moving_cost = cost;
        self
    }

    pub fn transit(mut self, mode: TransitMode) -> Self {
        self.workload.config.transit = mode;
        self
    }

    pub fn max_wall_time(mut self, limit: f64) -> Self {
        self.workload.config.max_wall_time = Some(limit);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.workload.config.seed = seed;
        self
    }

    /// The unvalidated file, for tests that expect validation to fail.
    pub fn build_raw(self) -> RawWorkloadFile {
        self.workload
    }

    pub fn build(self) -> WorkloadFile {
        WorkloadFile::try_from(self.workload).expect("Failed to build valid workload from builder")
    }
}

impl Default for WorkloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobConfig`.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    pub fn new(arrival_time: f64) -> Self {
        Self {
            job: JobConfig {
                arrival_time,
                op: BTreeMap::new(),
            },
        }
    }

    pub fn op(mut self, name: &str, op: OpConfigBuilder) -> Self {
        self.job.op.insert(name.to_string(), op.build());
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}

/// Builder for `OpConfig`. Defaults to one task of duration 1 on type 0.
pub struct OpConfigBuilder {
    op: OpConfig,
}

impl OpConfigBuilder {
    pub fn new(num_tasks: usize) -> Self {
        Self {
            op: OpConfig {
                num_tasks,
                after: vec![],
                duration: DurationConfig::Fixed(vec![1.0]),
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.op.after.push(dep.to_string());
        self
    }

    /// Same fixed duration for worker type 0.
    pub fn duration(mut self, duration: f64) -> Self {
        self.op.duration = DurationConfig::Fixed(vec![duration]);
        self
    }

    /// Fixed durations indexed by worker type.
    pub fn durations(mut self, per_type: &[f64]) -> Self {
        self.op.duration = DurationConfig::Fixed(per_type.to_vec());
        self
    }

    /// Empirical samples for worker type 0.
    pub fn waves(mut self, first_wave: &[f64], rest_wave: &[f64]) -> Self {
        self.op.duration = DurationConfig::Empirical(vec![WaveSamples {
            first_wave: first_wave.to_vec(),
            rest_wave: rest_wave.to_vec(),
        }]);
        self
    }

    /// Empirical samples indexed by worker type; an empty entry marks that
    /// type as unable to run the operation.
    pub fn empirical(mut self, per_type: Vec<WaveSamples>) -> Self {
        self.op.duration = DurationConfig::Empirical(per_type);
        self
    }

    pub fn build(self) -> OpConfig {
        self.op
    }
}
