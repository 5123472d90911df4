// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{RawWorkloadFile, WorkloadFile};
use crate::errors::Result;

/// Read and deserialize a workload file without validating it.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawWorkloadFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let workload: RawWorkloadFile = toml::from_str(&contents)?;
    Ok(workload)
}

/// Read, deserialize and validate a workload file.
///
/// Validation covers numeric sanity, per-job dependency names, DAG
/// acyclicity, and worker/operation compatibility.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<WorkloadFile> {
    let raw = load_from_path(&path)?;
    let workload = WorkloadFile::try_from(raw)?;
    Ok(workload)
}

/// `Workload.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Workload.toml")
}
