// src/config/mod.rs

//! Workload files for dagsched.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a workload file from disk (`loader.rs`).
//! - Validate it (`validate.rs`).
//! - Turn it into engine inputs: jobs, workers, options (`build.rs`).

pub mod build;
pub mod loader;
pub mod model;
pub mod validate;

pub use build::{build_engine, build_jobs, build_workers, engine_options, initial_timeline};
pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    ConfigSection, DurationConfig, JobConfig, OpConfig, RawWorkloadFile, WorkerGroup,
    WorkloadFile,
};
