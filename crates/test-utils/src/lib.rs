pub mod builders;
pub mod pipe;

use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

static TRACING: Once = Once::new();

/// Install the tracing subscriber shared by the pipeline tests.
///
/// The filter comes from `DAGFLOW_LOG` (then `RUST_LOG`); without either,
/// the scheduler's own events run at `debug` and everything else at
/// `warn`, so a failing test shows edge resolution and node decisions
/// without drowning them in poller noise. Output goes through the test
/// writer, so passing tests stay quiet unless run with `-- --nocapture`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = std::env::var("DAGFLOW_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("dagflow=debug,warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .init();
    });
}
