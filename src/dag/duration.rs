// src/dag/duration.rs

//! Task-duration providers.
//!
//! The engine never looks inside a duration table; it only asks an
//! operation's [`DurationModel`] two questions:
//! - can a worker of this type run the operation at all?
//! - how long does the next task take for such a worker?
//!
//! Historical traces usually show that the first task a worker runs on an
//! operation is slower than the ones that follow (warm caches, loaded
//! binaries), so samples are split into a first wave and a rest wave.

use std::fmt::Debug;

use rand::Rng;
use rand::rngs::StdRng;
use serde::Deserialize;

use crate::types::WorkerType;

/// Which sample pool a task duration is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wave {
    /// The worker's first task on this operation.
    First,
    /// The worker just finished a task of the same operation.
    Rest,
}

/// Opaque per-operation duration provider.
pub trait DurationModel: Send + Sync + Debug {
    /// Duration of one task for `worker_type`, or `None` if that type cannot
    /// run the operation.
    fn sample(&self, worker_type: WorkerType, wave: Wave, rng: &mut StdRng) -> Option<f64>;

    /// Expected task duration for `worker_type`, if supported.
    fn mean(&self, worker_type: WorkerType) -> Option<f64>;

    fn supports(&self, worker_type: WorkerType) -> bool {
        self.mean(worker_type).is_some()
    }
}

/// Deterministic durations: one fixed value per worker type.
#[derive(Debug, Clone)]
pub struct FixedDurations {
    per_type: Vec<f64>,
}

impl FixedDurations {
    /// `per_type[t]` is the task duration for worker type `t`. A non-finite or
    /// non-positive entry marks the type as incompatible.
    pub fn new(per_type: Vec<f64>) -> Self {
        Self { per_type }
    }

    /// Same duration for worker type 0 only.
    pub fn uniform(duration: f64) -> Self {
        Self::new(vec![duration])
    }
}

impl DurationModel for FixedDurations {
    fn sample(&self, worker_type: WorkerType, _wave: Wave, _rng: &mut StdRng) -> Option<f64> {
        self.mean(worker_type)
    }

    fn mean(&self, worker_type: WorkerType) -> Option<f64> {
        self.per_type
            .get(worker_type)
            .copied()
            .filter(|d| d.is_finite() && *d > 0.0)
    }
}

/// Observed task durations for one worker type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WaveSamples {
    #[serde(default)]
    pub first_wave: Vec<f64>,
    #[serde(default)]
    pub rest_wave: Vec<f64>,
}

impl WaveSamples {
    fn pool(&self, wave: Wave) -> &[f64] {
        // An empty pool borrows from the other wave rather than failing.
        match wave {
            Wave::First if !self.first_wave.is_empty() => &self.first_wave,
            Wave::Rest if !self.rest_wave.is_empty() => &self.rest_wave,
            Wave::First => &self.rest_wave,
            Wave::Rest => &self.first_wave,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first_wave.is_empty() && self.rest_wave.is_empty()
    }
}

/// Durations drawn uniformly from recorded trace samples.
#[derive(Debug, Clone)]
pub struct EmpiricalDurations {
    per_type: Vec<WaveSamples>,
}

impl EmpiricalDurations {
    /// `per_type[t]` holds the samples for worker type `t`; a type with no
    /// samples at all is incompatible. Non-finite and non-positive samples are
    /// dropped.
    pub fn new(mut per_type: Vec<WaveSamples>) -> Self {
        for samples in &mut per_type {
            samples.first_wave.retain(|d| d.is_finite() && *d > 0.0);
            samples.rest_wave.retain(|d| d.is_finite() && *d > 0.0);
        }
        Self { per_type }
    }
}

impl DurationModel for EmpiricalDurations {
    fn sample(&self, worker_type: WorkerType, wave: Wave, rng: &mut StdRng) -> Option<f64> {
        let samples = self.per_type.get(worker_type)?;
        let pool = samples.pool(wave);
        if pool.is_empty() {
            return None;
        }
        Some(pool[rng.gen_range(0..pool.len())])
    }

    fn mean(&self, worker_type: WorkerType) -> Option<f64> {
        let samples = self.per_type.get(worker_type)?;
        if samples.is_empty() {
            return None;
        }
        let all = samples.first_wave.iter().chain(samples.rest_wave.iter());
        let count = samples.first_wave.len() + samples.rest_wave.len();
        Some(all.sum::<f64>() / count as f64)
    }
}
