//! Runs crowd scenarios one after another on the test thread.

use std::sync::Arc;

use rspec::{block::Suite, ConfigurationBuilder, Logger, Runner};

/// Runs `suite` in declaration order; each scenario sees the frames the
/// previous ones already played on the shared app.
///
/// The first failing expectation ends the test process with a failure status.
pub fn play_in_order<T>(suite: &Suite<T>)
where
    T: Clone + Send + Sync + std::fmt::Debug,
{
    let config = ConfigurationBuilder::default()
        .parallel(false)
        .exit_on_failure(true)
        .build()
        .unwrap_or_else(|e| panic!("invalid scenario runner configuration: {e}"));
    let report = Arc::new(Logger::new(std::io::stdout()));
    Runner::new(config, vec![report]).run(suite);
}
