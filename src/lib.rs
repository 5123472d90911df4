// src/lib.rs

pub mod agent;
pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod types;

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

use crate::agent::FifoAgent;
use crate::cli::CliArgs;
use crate::config::{WorkloadFile, build_engine, engine_options, load_and_validate};
use crate::engine::{EpisodeSummary, run_episodes_parallel};

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the workload, then either prints it (`--dry-run`) or
/// runs `--episodes` independent episodes with the FIFO baseline agent and
/// prints one summary line per episode.
pub async fn run(args: CliArgs) -> Result<()> {
    let workload_path = PathBuf::from(&args.workload);
    let workload = load_and_validate(&workload_path)?;

    if args.dry_run {
        print_dry_run(&workload);
        return Ok(());
    }

    let mut options = engine_options(&workload);
    if let Some(limit) = args.max_wall_time {
        options.max_wall_time = Some(limit);
    }
    let base_seed = args.seed.unwrap_or(options.seed);
    let parallelism = args.parallelism;

    info!(
        workload = %workload_path.display(),
        episodes = args.episodes,
        jobs = workload.job.len(),
        workers = workload.num_workers(),
        "starting simulation"
    );

    let summaries = run_episodes_parallel(args.episodes, move |episode| {
        let mut options = options;
        options.seed = base_seed.wrapping_add(episode as u64);
        let engine = build_engine(&workload, options)?;
        let agent = FifoAgent { parallelism };
        Ok((engine, agent))
    })
    .await?;

    print_summaries(&summaries);
    Ok(())
}

fn print_summaries(summaries: &[EpisodeSummary]) {
    for (episode, s) in summaries.iter().enumerate() {
        let mean = s
            .mean_job_duration
            .map(|m| format!("{m:.3}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "episode {episode}: reward={:.6} wall_time={:.3} completed_jobs={} \
             active_jobs={} mean_job_duration={mean} steps={} decisions={}{}",
            s.total_reward,
            s.wall_time,
            s.completed_jobs,
            s.active_jobs,
            s.steps,
            s.decisions,
            if s.truncated { " (truncated)" } else { "" },
        );
    }

    if summaries.len() > 1 {
        let mean_reward =
            summaries.iter().map(|s| s.total_reward).sum::<f64>() / summaries.len() as f64;
        println!("mean reward over {} episodes: {mean_reward:.6}", summaries.len());
    }
}

/// Print the validated workload without simulating it.
fn print_dry_run(workload: &WorkloadFile) {
    let c = &workload.config;
    println!("dagsched dry-run");
    println!("  config.reward_scale = {}", c.reward_scale);
    println!("  config.moving_cost = {}", c.moving_cost);
    println!("  config.transit = {:?}", c.transit);
    if let Some(limit) = c.max_wall_time {
        println!("  config.max_wall_time = {limit}");
    }
    println!("  config.seed = {}", c.seed);
    println!();

    println!("workers ({}):", workload.num_workers());
    for group in &workload.workers {
        println!("  - {} x type {}", group.count, group.worker_type);
    }
    println!();

    println!("jobs ({}, {} tasks):", workload.job.len(), workload.num_tasks());
    for (id, job) in workload.job.iter().enumerate() {
        println!("  - job {id} arrives at {}", job.arrival_time);
        for (index, (name, op)) in job.op.iter().enumerate() {
            println!("      [{index}] {name}: {} tasks", op.num_tasks);
            if !op.after.is_empty() {
                println!("          after: {:?}", op.after);
            }
        }
    }

    debug!("dry-run complete (no simulation)");
}
