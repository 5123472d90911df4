// src/engine/runtime.rs

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::errors::{DagSchedError, Result};
use crate::types::Action;

use super::core::SimulationEngine;

/// Outcome of one episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    pub total_reward: f64,
    /// Number of `step` calls, including the initial one.
    pub steps: usize,
    /// Steps that carried an action.
    pub decisions: usize,
    pub wall_time: f64,
    pub completed_jobs: usize,
    pub active_jobs: usize,
    pub mean_job_duration: Option<f64>,
    pub truncated: bool,
}

/// Drive a freshly reset engine to termination with `agent`.
///
/// The engine is the pure core; this loop is the only place an agent is
/// consulted. The agent is asked whenever an action is available, both when
/// the previous step stopped for a decision and when it stopped because the
/// timeline ran dry with idle workers and open operations.
pub fn run_episode<A: Agent + ?Sized>(
    engine: &mut SimulationEngine,
    agent: &mut A,
) -> Result<EpisodeSummary> {
    let mut total_reward = 0.0;
    let mut steps = 0;
    let mut decisions = 0;

    let mut result = engine.step(None)?;
    total_reward += result.reward;
    steps += 1;

    while !result.done {
        let action = if engine.actions_available() {
            agent.choose_action(engine)
        } else {
            None
        };

        if !makes_progress(engine, action.as_ref()) && engine.pending_events() == 0 {
            warn!(
                wall_time = engine.wall_time(),
                active_jobs = engine.active_jobs().len(),
                "agent declined to act and nothing else can happen; stopping episode"
            );
            break;
        }

        if let Some(action) = &action {
            debug!(op = %action.op, workers = action.workers, "agent decision");
            decisions += 1;
        }

        result = engine.step(action)?;
        total_reward += result.reward;
        steps += 1;
    }

    let summary = EpisodeSummary {
        total_reward,
        steps,
        decisions,
        wall_time: engine.wall_time(),
        completed_jobs: engine.completed_jobs().len(),
        active_jobs: engine.active_jobs().len(),
        mean_job_duration: engine.mean_job_duration(),
        truncated: engine.is_truncated(),
    };
    info!(
        total_reward = summary.total_reward,
        steps = summary.steps,
        wall_time = summary.wall_time,
        completed_jobs = summary.completed_jobs,
        truncated = summary.truncated,
        "episode finished"
    );
    Ok(summary)
}

/// An action moves at least one worker iff it asks for workers and some
/// compatible worker is free.
fn makes_progress(engine: &SimulationEngine, action: Option<&Action>) -> bool {
    action.is_some_and(|a| a.workers > 0 && engine.compatible_available_workers(a.op) > 0)
}

/// Run `episodes` independent episodes concurrently.
///
/// `make(i)` builds a reset engine and an agent for episode `i`; every
/// episode owns its state outright and runs on a blocking tokio task.
/// Summaries are returned in episode order.
pub async fn run_episodes_parallel<A, F>(episodes: usize, make: F) -> Result<Vec<EpisodeSummary>>
where
    A: Agent + Send + 'static,
    F: Fn(usize) -> Result<(SimulationEngine, A)> + Send + Sync + 'static,
{
    let make = Arc::new(make);
    let mut set = JoinSet::new();

    for index in 0..episodes {
        let make = Arc::clone(&make);
        set.spawn_blocking(move || {
            let result = make(index).and_then(|(mut engine, mut agent)| {
                run_episode(&mut engine, &mut agent)
            });
            (index, result)
        });
    }

    let mut summaries: Vec<Option<EpisodeSummary>> = vec![None; episodes];
    while let Some(joined) = set.join_next().await {
        let (index, result) = joined.map_err(|e| DagSchedError::Other(anyhow::Error::new(e)))?;
        summaries[index] = Some(result?);
    }

    summaries
        .into_iter()
        .enumerate()
        .map(|(index, summary)| {
            summary.ok_or_else(|| {
                DagSchedError::Other(anyhow::anyhow!("episode {index} produced no summary"))
            })
        })
        .collect()
}
