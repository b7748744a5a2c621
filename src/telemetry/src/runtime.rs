//! Background sampler for gauges that have no natural update point.

use prometheus::core::Collector;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use crate::metrics::{STAGE_WORKERS_ACTIVE_GAUGE, TOKIO_TASKS_GAUGE};

/// Spawn a task that refreshes [`TOKIO_TASKS_GAUGE`] every `poll_interval`
/// until `stop` is cancelled.
///
/// Each sample is also logged next to the number of running stage workers, so
/// tasks that outlive their pipeline stand out in the debug log.
pub fn spawn_runtime_sampler(poll_interval: Duration, stop: CancellationToken) -> JoinHandle<()> {
    let handle = Handle::current();
    tokio::spawn(async move {
        let mut ticker = interval(poll_interval);
        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let alive_tasks = handle.metrics().num_alive_tasks();
            TOKIO_TASKS_GAUGE.set(i64::try_from(alive_tasks).unwrap_or(i64::MAX));
            tracing::debug!(
                alive_tasks,
                stage_workers = active_stage_workers(),
                "runtime sample"
            );
        }
        tracing::debug!("runtime sampler stopped");
    })
}

/// Stage workers currently running, summed over every stage kind.
pub fn active_stage_workers() -> i64 {
    STAGE_WORKERS_ACTIVE_GAUGE
        .collect()
        .iter()
        .flat_map(|family| family.get_metric())
        .map(|metric| metric.get_gauge().get_value() as i64)
        .sum()
}
