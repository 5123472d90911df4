// tests/engine_scenarios.rs
mod common;
use crate::common::builders::{JobConfigBuilder, OpConfigBuilder, WorkloadBuilder};
use crate::common::{OP_A, OP_B, approx_eq, assert_consistent, chain_workload, engine_for, init_tracing};

use std::error::Error;

use dagsched::config::{build_engine, build_workers, engine_options, initial_timeline};
use dagsched::dag::{OpState, WaveSamples};
use dagsched::engine::{SimulationEngine, Worker, WorkerState};
use dagsched::errors::DagSchedError;
use dagsched::types::{Action, OpId, TransitMode};

type TestResult = Result<(), Box<dyn Error>>;

fn play_chain(engine: &mut SimulationEngine) -> Result<Vec<(f64, bool)>, DagSchedError> {
    let mut out = vec![];
    for action in [None, Some(Action::new(OP_A, 2)), Some(Action::new(OP_B, 2))] {
        let r = engine.step(action)?;
        out.push((r.reward, r.done));
    }
    Ok(out)
}

const SCALE: f64 = 1e-5;

#[test]
fn chain_job_runs_to_completion_with_reward_equal_to_sojourn() -> TestResult {
    init_tracing();

    let workload = chain_workload(1, 2, 10.0, 5.0).build();
    let mut engine = engine_for(&workload);

    let r0 = engine.step(None)?;
    assert_eq!(r0.reward, 0.0);
    assert!(!r0.done);
    assert_eq!(engine.frontier_ops().collect::<Vec<_>>(), vec![OP_A]);
    assert!(engine.actions_available());

    // Both A tasks run back to back on the single worker; the step stops
    // once A completes and B enters the frontier.
    let r1 = engine.step(Some(Action::new(OP_A, 1)))?;
    assert!(!r1.done);
    assert_eq!(engine.wall_time(), 20.0);
    assert!(approx_eq(r1.reward, -SCALE * 20.0));
    assert_eq!(engine.frontier_ops().collect::<Vec<_>>(), vec![OP_B]);
    assert_eq!(engine.operation(OP_A).map(|o| o.state()), Some(OpState::Completed));
    assert_consistent(&engine);

    let r2 = engine.step(Some(Action::new(OP_B, 1)))?;
    assert!(r2.done);
    assert_eq!(engine.wall_time(), 25.0);
    assert!(engine.all_jobs_complete());
    assert_eq!(engine.completed_jobs(), &[0]);

    let total = r0.reward + r1.reward + r2.reward;
    let sojourn = engine.job(0).and_then(|j| j.sojourn_time()).ok_or("job not complete")?;
    assert_eq!(sojourn, 25.0);
    assert!(total < 0.0);
    assert!(approx_eq(total, -SCALE * sojourn));
    assert_eq!(engine.mean_job_duration(), Some(25.0));

    Ok(())
}

#[test]
fn request_beyond_remaining_tasks_still_sends_every_requested_worker() -> TestResult {
    init_tracing();

    let workload = WorkloadBuilder::new()
        .workers(3)
        .moving_cost(5.0)
        .job(JobConfigBuilder::new(0.0).op("A", OpConfigBuilder::new(2).duration(4.0)))
        .build();
    let mut engine = engine_for(&workload);

    engine.step(None)?;
    engine.step(Some(Action::new(OP_A, 10)))?;
    assert_consistent(&engine);

    // All three travel; the last one finds A saturated and idles at the job.
    assert_eq!(engine.wall_time(), 5.0);
    assert!(engine.workers().iter().all(|w| w.job() == Some(0)));
    assert!(engine.worker(2).is_some_and(|w| w.is_available()));
    assert_eq!(engine.saturated_ops().collect::<Vec<_>>(), vec![OP_A]);
    assert!(!engine.actions_available());

    let result = engine.step(None)?;
    assert!(result.done);
    assert_eq!(engine.wall_time(), 9.0);
    assert!(engine.workers().iter().all(|w| w.job().is_none()));
    assert_consistent(&engine);
    Ok(())
}

#[test]
fn idle_local_workers_count_against_the_request() -> TestResult {
    init_tracing();

    let workload = WorkloadBuilder::new()
        .workers(3)
        .moving_cost(5.0)
        .job(
            JobConfigBuilder::new(0.0)
                .op("A", OpConfigBuilder::new(2).duration(1.0))
                .op("B", OpConfigBuilder::new(1).duration(1.0).after("A")),
        )
        .build();
    let mut engine = engine_for(&workload);

    engine.step(None)?;
    // Both tasks of A finish at t = 6 and hand the decision back.
    engine.step(Some(Action::new(OP_A, 2)))?;
    assert_eq!(engine.frontier_ops().collect::<Vec<_>>(), vec![OP_B]);
    assert_eq!(engine.wall_time(), 6.0);

    // Two idle workers are local already: one binds, the other stays put and
    // no remote worker is sent in its place.
    engine.step(Some(Action::new(OP_B, 2)))?;
    assert_eq!(engine.worker(2).map(|w| w.state()), Some(WorkerState::Idle));
    assert_eq!(engine.worker(2).and_then(|w| w.job()), None);
    assert_eq!(engine.wall_time(), 7.0);
    assert!(engine.all_jobs_complete());
    assert_consistent(&engine);
    Ok(())
}

#[test]
fn request_beyond_available_workers_assigns_every_available_worker() -> TestResult {
    init_tracing();

    let workload = WorkloadBuilder::new()
        .workers(2)
        .job(JobConfigBuilder::new(0.0).op("A", OpConfigBuilder::new(5).duration(1.0)))
        .build();
    let mut engine = engine_for(&workload);

    engine.step(None)?;
    let result = engine.step(Some(Action::new(OP_A, 10)))?;
    assert!(result.done);

    let op = engine.operation(OP_A).ok_or("missing op")?;
    let mut runners: Vec<_> = op.tasks().iter().filter_map(|t| t.worker).collect();
    runners.sort_unstable();
    runners.dedup();
    assert_eq!(runners, vec![0, 1]);
    // Two workers, five unit tasks: ceil(5 / 2) rounds.
    assert_eq!(engine.wall_time(), 3.0);
    Ok(())
}

#[test]
fn request_for_fewer_workers_leaves_the_rest_available() -> TestResult {
    init_tracing();

    let workload = WorkloadBuilder::new()
        .workers(3)
        .moving_cost(100.0)
        .job(
            JobConfigBuilder::new(0.0)
                .op("A", OpConfigBuilder::new(4).duration(10.0))
                .op("B", OpConfigBuilder::new(1).duration(10.0)),
        )
        .build();
    let mut engine = engine_for(&workload);

    engine.step(None)?;
    assert_eq!(engine.compatible_available_workers(OP_A), 3);

    // B has a single task, so only one worker leaves; the step returns once
    // B completes at t = 110.
    engine.step(Some(Action::new(OP_B, 1)))?;
    assert_eq!(engine.wall_time(), 110.0);
    assert_eq!(engine.available_workers().filter(|w| w.job().is_none()).count(), 2);
    assert_consistent(&engine);
    Ok(())
}

#[test]
fn action_on_non_frontier_operation_is_rejected_without_side_effects() -> TestResult {
    init_tracing();

    let workload = chain_workload(1, 1, 1.0, 1.0).build();
    let mut engine = engine_for(&workload);
    engine.step(None)?;

    let before_time = engine.wall_time();
    let before_frontier: Vec<_> = engine.frontier_ops().collect();

    match engine.step(Some(Action::new(OP_B, 1))) {
        Err(DagSchedError::InvalidAction { op, reason }) => {
            assert_eq!(op, OP_B);
            assert!(reason.contains("frontier"));
        }
        other => panic!("Expected InvalidAction, got: {other:?}"),
    }

    assert_eq!(engine.wall_time(), before_time);
    assert_eq!(engine.frontier_ops().collect::<Vec<_>>(), before_frontier);
    assert_eq!(engine.available_workers().count(), 1);
    assert_consistent(&engine);
    Ok(())
}

#[test]
fn action_on_unknown_job_or_operation_is_rejected() -> TestResult {
    init_tracing();

    let workload = chain_workload(1, 1, 1.0, 1.0).build();
    let mut engine = engine_for(&workload);
    engine.step(None)?;

    let unknown_job = OpId::new(7, 0);
    assert!(matches!(
        engine.step(Some(Action::new(unknown_job, 1))),
        Err(DagSchedError::InvalidAction { op, .. }) if op == unknown_job
    ));

    let unknown_op = OpId::new(0, 5);
    assert!(matches!(
        engine.step(Some(Action::new(unknown_op, 1))),
        Err(DagSchedError::InvalidAction { op, .. }) if op == unknown_op
    ));
    Ok(())
}

#[test]
fn local_workers_skip_transit_and_remote_workers_pay_it() -> TestResult {
    init_tracing();

    let workload = chain_workload(1, 1, 10.0, 10.0).moving_cost(100.0).build();
    let mut engine = engine_for(&workload);
    engine.step(None)?;

    // First dispatch: the worker belongs to no job yet, so it travels.
    engine.step(Some(Action::new(OP_A, 1)))?;
    assert_eq!(engine.wall_time(), 110.0);
    assert_eq!(engine.worker(0).and_then(|w| w.job()), Some(0));

    // Now local to job 0: B starts immediately.
    let result = engine.step(Some(Action::new(OP_B, 1)))?;
    assert!(result.done);
    assert_eq!(engine.wall_time(), 120.0);
    Ok(())
}

#[test]
fn moving_worker_between_jobs_is_charged_and_reward_covers_both_jobs() -> TestResult {
    init_tracing();

    let x = OpId::new(0, 0);
    let y = OpId::new(1, 0);
    let workload = WorkloadBuilder::new()
        .workers(1)
        .moving_cost(50.0)
        .job(JobConfigBuilder::new(0.0).op("X", OpConfigBuilder::new(1).duration(10.0)))
        .job(JobConfigBuilder::new(0.0).op("Y", OpConfigBuilder::new(1).duration(10.0)))
        .build();
    let mut engine = engine_for(&workload);

    let mut total = engine.step(None)?.reward;
    assert_eq!(engine.active_jobs(), &[0]);

    // Dispatching to job 0 does not need the agent, but job 1's arrival at
    // the same instant does.
    total += engine.step(Some(Action::new(x, 1)))?.reward;
    assert_eq!(engine.active_jobs(), &[0, 1]);
    assert_eq!(engine.wall_time(), 0.0);
    assert!(matches!(
        engine.worker(0).map(|w| w.state()),
        Some(WorkerState::Moving { to, .. }) if to == x
    ));
    assert!(!engine.actions_available());

    total += engine.step(None)?.reward;
    assert_eq!(engine.wall_time(), 60.0);
    assert_eq!(engine.completed_jobs(), &[0]);

    let last = engine.step(Some(Action::new(y, 1)))?;
    total += last.reward;
    assert!(last.done);
    assert_eq!(engine.wall_time(), 120.0);

    let sojourns: f64 = engine.jobs().filter_map(|j| j.sojourn_time()).sum();
    assert_eq!(sojourns, 180.0);
    assert!(approx_eq(total, -SCALE * sojourns));
    assert_eq!(engine.mean_job_duration(), Some(90.0));
    Ok(())
}

#[test]
fn worker_continues_on_its_operation_with_rest_wave_durations() -> TestResult {
    init_tracing();

    let workload = WorkloadBuilder::new()
        .workers(1)
        .job(JobConfigBuilder::new(0.0).op("A", OpConfigBuilder::new(3).waves(&[10.0], &[3.0])))
        .build();
    let mut engine = engine_for(&workload);

    engine.step(None)?;
    let result = engine.step(Some(Action::new(OP_A, 1)))?;
    assert!(result.done);
    assert_eq!(engine.wall_time(), 16.0);

    let op = engine.operation(OP_A).ok_or("missing op")?;
    let accepted: Vec<_> = op.tasks().iter().map(|t| t.accepted_at).collect();
    let completed: Vec<_> = op.tasks().iter().map(|t| t.completed_at).collect();
    assert_eq!(accepted, vec![Some(0.0), Some(10.0), Some(13.0)]);
    assert_eq!(completed, vec![Some(10.0), Some(13.0), Some(16.0)]);
    Ok(())
}

#[test]
fn incompatible_workers_are_never_dispatched() -> TestResult {
    init_tracing();

    let type_one_only = vec![
        WaveSamples::default(),
        WaveSamples {
            first_wave: vec![5.0],
            rest_wave: vec![],
        },
    ];
    let workload = WorkloadBuilder::new()
        .typed_workers(1, 0)
        .typed_workers(1, 1)
        .job(JobConfigBuilder::new(0.0).op("A", OpConfigBuilder::new(2).empirical(type_one_only)))
        .build();
    let mut engine = engine_for(&workload);

    engine.step(None)?;
    assert_eq!(engine.compatible_available_workers(OP_A), 1);
    let mask = engine.action_mask();
    assert_eq!(mask.ops, vec![OP_A]);
    assert_eq!(mask.max_workers, 2);

    let result = engine.step(Some(Action::new(OP_A, 2)))?;
    assert!(result.done);
    let op = engine.operation(OP_A).ok_or("missing op")?;
    assert!(op.tasks().iter().all(|t| t.worker == Some(1)));
    assert_eq!(engine.worker(0).map(|w| w.state()), Some(WorkerState::Idle));
    // Empty rest wave falls back to the first-wave samples.
    assert_eq!(engine.wall_time(), 10.0);
    Ok(())
}

#[test]
fn wall_time_bound_truncates_the_episode() -> TestResult {
    init_tracing();

    let workload = chain_workload(1, 2, 10.0, 5.0).max_wall_time(15.0).build();
    let mut engine = engine_for(&workload);

    engine.step(None)?;
    let result = engine.step(Some(Action::new(OP_A, 1)))?;
    assert!(result.done);
    assert!(engine.is_truncated());
    assert_eq!(engine.wall_time(), 15.0);
    assert!(approx_eq(result.reward, -SCALE * 15.0));
    assert_eq!(engine.active_jobs(), &[0]);

    let after = engine.step(None)?;
    assert_eq!(after.reward, 0.0);
    assert!(after.done);
    Ok(())
}

#[test]
fn withheld_action_keeps_episode_open() -> TestResult {
    init_tracing();

    let workload = chain_workload(1, 1, 1.0, 1.0).build();
    let mut engine = engine_for(&workload);

    engine.step(None)?;
    let idle = engine.step(None)?;
    assert!(!idle.done);
    assert_eq!(idle.reward, 0.0);
    assert_eq!(engine.pending_events(), 0);
    assert!(engine.actions_available());
    Ok(())
}

#[test]
fn nothing_schedulable_before_first_arrival() -> TestResult {
    init_tracing();

    let workload = WorkloadBuilder::new()
        .workers(1)
        .job(JobConfigBuilder::new(5.0).op("A", OpConfigBuilder::new(1).duration(1.0)))
        .build();
    let engine = engine_for(&workload);

    assert!(!engine.actions_available());
    assert!(engine.action_mask().is_empty());
    assert_eq!(engine.action_mask().max_workers, 0);
    assert_eq!(engine.num_seen_jobs(), 0);
    assert_eq!(engine.pending_events(), 1);
    Ok(())
}

#[test]
fn reset_replays_an_identical_episode() -> TestResult {
    init_tracing();

    let workload = chain_workload(2, 3, 4.0, 2.0).build();
    let mut engine = engine_for(&workload);

    let first = play_chain(&mut engine)?;
    engine.reset(initial_timeline(&workload), build_workers(&workload))?;
    assert_eq!(engine.wall_time(), 0.0);
    assert_eq!(engine.num_seen_jobs(), 0);
    let second = play_chain(&mut engine)?;

    assert_eq!(first, second);
    assert_eq!(first.last().map(|r| r.1), Some(true));
    Ok(())
}

#[test]
fn reset_rejects_misnumbered_workers_and_keeps_the_episode() -> TestResult {
    init_tracing();

    let workload = chain_workload(1, 1, 1.0, 1.0).build();
    let mut engine = engine_for(&workload);
    engine.step(None)?;

    let result = engine.reset(initial_timeline(&workload), vec![Worker::new(7, 0)]);
    assert!(matches!(result, Err(DagSchedError::ConfigError(msg)) if msg.contains("id 7")));

    assert_eq!(engine.num_seen_jobs(), 1);
    assert_eq!(engine.workers().iter().map(|w| w.id()).collect::<Vec<_>>(), vec![0]);
    assert!(engine.is_in_frontier(OP_A));
    Ok(())
}

#[test]
fn non_positive_moving_cost_never_moves_time_backwards() -> TestResult {
    init_tracing();

    let workload = WorkloadBuilder::new()
        .workers(1)
        .job(JobConfigBuilder::new(10.0).op("A", OpConfigBuilder::new(1).duration(1.0)))
        .build();

    for transit in [TransitMode::Constant, TransitMode::Exponential] {
        let mut options = engine_options(&workload);
        options.moving_cost = -5.0;
        options.transit = transit;
        let mut engine = build_engine(&workload, options)?;

        engine.step(None)?;
        assert_eq!(engine.wall_time(), 10.0);
        let result = engine.step(Some(Action::new(OP_A, 1)))?;
        assert!(result.done, "{transit:?}");
        assert_eq!(engine.wall_time(), 11.0, "{transit:?}");
    }
    Ok(())
}

#[test]
fn completed_job_releases_its_workers_including_late_arrivals() -> TestResult {
    init_tracing();

    let workload = chain_workload(3, 2, 1.0, 1.0).moving_cost(10.0).build();
    let mut engine = engine_for(&workload);

    engine.step(None)?;
    engine.step(Some(Action::new(OP_A, 2)))?;
    assert_eq!(engine.wall_time(), 11.0);
    assert_eq!(engine.job(0).map(|j| j.local_workers().collect::<Vec<_>>()), Some(vec![0, 1]));

    // Workers 0 and 1 are local, so one binds to B, one idles, and worker 2
    // is sent to make up the request.
    engine.step(Some(Action::new(OP_B, 3)))?;
    assert_eq!(engine.wall_time(), 12.0);
    assert!(engine.all_jobs_complete());
    assert!(engine.worker(2).is_some_and(|w| w.is_moving()));
    assert!(engine.workers().iter().all(|w| w.job().is_none()));
    assert_eq!(engine.job(0).map(|j| j.local_workers().count()), Some(0));
    assert_consistent(&engine);

    // The late arrival finds the job finished and stays unattached.
    let last = engine.step(None)?;
    assert!(last.done);
    assert_eq!(last.reward, 0.0);
    assert_eq!(engine.wall_time(), 21.0);
    assert_eq!(
        engine.worker(2).map(|w| (w.state(), w.job())),
        Some((WorkerState::Idle, None))
    );
    assert_eq!(engine.job(0).map(|j| j.local_workers().count()), Some(0));
    assert_consistent(&engine);
    Ok(())
}
