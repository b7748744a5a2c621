//! Stage workers
//!
//! Every source and operator runs in its own tokio task and owns the sender of
//! its output channel. A worker stops when:
//! - its upstream channel closes (or a source runs out of values)
//! - the context it was built with is cancelled
//! - its stream's done token is cancelled by a terminal consumer or downstream stage
//! - the receiver of its output channel is dropped
//!
//! Dropping the sender is what closes the channel for the reader downstream.
//! When an operator worker exits it also cancels the done token of the stream it
//! consumed, so a stop anywhere in the chain reaches every ancestor.
//!
//! A channel that closes because its worker panicked looks like exhaustion to
//! the reader, so whoever sees the close joins the worker and resumes the panic.

mod stats;

pub use stats::{StageStats, StageStatsSnapshot};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use telemetry::ActiveWorkerGuard;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::operator::Operator;
use crate::stream::Inlet;
use stats::FinishGuard;

static NEXT_STAGE_SEQ: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a stage, rendered as `kind#seq`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StageId {
    kind: &'static str,
    seq: u64,
}

impl StageId {
    pub fn next(kind: &'static str) -> Self {
        Self {
            kind,
            seq: NEXT_STAGE_SEQ.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.seq)
    }
}

/// Why a stage worker closed its output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Upstream closed or the source ran out of values.
    Exhausted,
    /// The governing context was cancelled.
    Cancelled,
    /// The stream's done token was cancelled from downstream.
    Stopped,
    /// The output receiver was dropped.
    Detached,
    /// The operator reached its own limit (`take`).
    Limit,
    /// The worker unwound without choosing a reason, e.g. a panicking closure.
    Aborted,
}

/// Everything a worker needs besides its input.
pub(crate) struct StageContext<T> {
    pub(crate) ctx: CancellationToken,
    pub(crate) done: CancellationToken,
    pub(crate) output: mpsc::Sender<T>,
    pub(crate) stats: Arc<StageStats>,
}

/// Send one value downstream, racing the send against both stop signals.
pub(crate) async fn emit<T>(stage: &StageContext<T>, value: T) -> Result<(), StopReason> {
    tokio::select! {
        biased;
        _ = stage.ctx.cancelled() => Err(StopReason::Cancelled),
        _ = stage.done.cancelled() => Err(StopReason::Stopped),
        sent = stage.output.send(value) => {
            sent.map_err(|_| StopReason::Detached)?;
            stage.stats.record_out();
            Ok(())
        }
    }
}

/// Wait for a worker whose output channel has closed and resume its panic, if
/// it had one.
pub(crate) async fn join_upstream(task: JoinHandle<()>) {
    match task.await {
        Ok(()) => {}
        Err(err) if err.is_panic() => panic::resume_unwind(err.into_panic()),
        Err(err) => tracing::warn!(error = %err, "upstream worker cancelled by the runtime"),
    }
}

/// Worker loop shared by every source: pull from `values` and emit until a stop.
pub(crate) async fn run_source<T, I>(mut values: I, stage: StageContext<T>)
where
    I: Iterator<Item = T>,
{
    let id = stage.stats.stage_id().clone();
    let _active = ActiveWorkerGuard::new(id.kind());
    let mut finish = FinishGuard::new(Arc::clone(&stage.stats));

    let reason = loop {
        if stage.ctx.is_cancelled() {
            break StopReason::Cancelled;
        }
        if stage.done.is_cancelled() {
            break StopReason::Stopped;
        }
        let Some(value) = values.next() else {
            break StopReason::Exhausted;
        };
        if let Err(reason) = emit(&stage, value).await {
            break reason;
        }
    };

    drop(stage.output);
    finish.set_reason(reason);
    tracing::debug!(stage_id = %id, reason = ?reason, "source stopped");
}

/// Worker loop shared by every operator.
///
/// `upstream` cancels the consumed stream's done token when the worker returns.
pub(crate) async fn run_operator<T, O>(
    mut operator: O,
    inlet: Inlet<T>,
    upstream: DropGuard,
    stage: StageContext<O::Output>,
) where
    O: Operator<T>,
{
    let id = stage.stats.stage_id().clone();
    let _active = ActiveWorkerGuard::new(id.kind());
    let mut finish = FinishGuard::new(Arc::clone(&stage.stats));
    let Inlet {
        receiver: mut input,
        task: upstream_task,
    } = inlet;

    let reason = loop {
        if operator.is_exhausted() {
            break StopReason::Limit;
        }
        let item = tokio::select! {
            biased;
            _ = stage.ctx.cancelled() => break StopReason::Cancelled,
            _ = stage.done.cancelled() => break StopReason::Stopped,
            _ = stage.output.closed() => break StopReason::Detached,
            item = input.recv() => item,
        };
        let Some(value) = item else {
            break StopReason::Exhausted;
        };
        stage.stats.record_in();
        match operator.apply(value) {
            Some(out) => {
                if let Err(reason) = emit(&stage, out).await {
                    break reason;
                }
            }
            None => tracing::trace!(stage_id = %id, "value dropped"),
        }
    };

    if reason == StopReason::Exhausted {
        join_upstream(upstream_task).await;
    }

    drop(stage.output);
    drop(upstream);
    drop(input);
    finish.set_reason(reason);
    tracing::debug!(stage_id = %id, reason = ?reason, "operator stopped");
}
