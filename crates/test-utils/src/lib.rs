pub mod builders;

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

use dagsched::config::{WorkloadFile, build_engine, engine_options};
use dagsched::engine::{EngineOptions, SimulationEngine};
use dagsched::types::TransitMode;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Engine options with deterministic, free worker transit.
pub fn instant_transit() -> EngineOptions {
    EngineOptions {
        moving_cost: 0.0,
        transit: TransitMode::Constant,
        ..EngineOptions::default()
    }
}

/// Engine for `workload` using its own `[config]` section.
pub fn engine_for(workload: &WorkloadFile) -> SimulationEngine {
    build_engine(workload, engine_options(workload))
        .expect("builder workloads have well-formed worker ids")
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}
