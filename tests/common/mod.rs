#![allow(dead_code)]

pub use dagsched_test_utils::{builders, engine_for, init_tracing, instant_transit, with_timeout};

use dagsched::agent::Agent;
use dagsched::engine::{SimulationEngine, StepResult, audit};
use dagsched::types::OpId;

use self::builders::{JobConfigBuilder, OpConfigBuilder, WorkloadBuilder};

/// One job, `A -> B`, with `a_tasks` tasks of `a_dur` and one task of `b_dur`.
pub fn chain_workload(workers: usize, a_tasks: usize, a_dur: f64, b_dur: f64) -> WorkloadBuilder {
    WorkloadBuilder::new().workers(workers).job(
        JobConfigBuilder::new(0.0)
            .op("A", OpConfigBuilder::new(a_tasks).duration(a_dur))
            .op("B", OpConfigBuilder::new(1).duration(b_dur).after("A")),
    )
}

/// Operation handles for `chain_workload`: A is index 0, B index 1.
pub const OP_A: OpId = OpId { job: 0, index: 0 };
pub const OP_B: OpId = OpId { job: 0, index: 1 };

/// Panic with every violation if the engine state is inconsistent.
pub fn assert_consistent(engine: &SimulationEngine) {
    if let Err(violations) = audit(engine) {
        panic!("engine state inconsistent: {violations:#?}");
    }
}

/// Drive an episode by hand, auditing after every step.
///
/// Returns every step result, the initial `step(None)` included.
pub fn drive<A: Agent>(engine: &mut SimulationEngine, agent: &mut A, max_steps: usize) -> Vec<StepResult> {
    let mut results = Vec::new();
    let mut last = engine.step(None).expect("initial step failed");
    assert_consistent(engine);
    results.push(last);

    while !last.done {
        assert!(results.len() < max_steps, "episode did not finish in {max_steps} steps");
        let action = if engine.actions_available() {
            agent.choose_action(engine)
        } else {
            None
        };
        last = engine.step(action).expect("step failed");
        assert_consistent(engine);
        results.push(last);
    }
    results
}

pub fn total_reward(results: &[StepResult]) -> f64 {
    results.iter().map(|r| r.reward).sum()
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}
