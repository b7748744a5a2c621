use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use telemetry::{STAGE_RECORDS_IN_TOTAL, STAGE_RECORDS_OUT_TOTAL};

use crate::stage::{StageId, StopReason};

/// Counters maintained by a stage worker while it runs.
#[derive(Debug)]
pub struct StageStats {
    stage_id: StageId,
    records_in: AtomicU64,
    records_out: AtomicU64,
    finished: AtomicBool,
    stop_reason: OnceLock<StopReason>,
}

impl StageStats {
    pub fn new(stage_id: StageId) -> Self {
        Self {
            stage_id,
            records_in: AtomicU64::new(0),
            records_out: AtomicU64::new(0),
            finished: AtomicBool::new(false),
            stop_reason: OnceLock::new(),
        }
    }

    pub fn stage_id(&self) -> &StageId {
        &self.stage_id
    }

    pub fn record_in(&self) {
        self.records_in.fetch_add(1, Ordering::Relaxed);
        STAGE_RECORDS_IN_TOTAL
            .with_label_values(&[self.stage_id.kind()])
            .inc();
    }

    pub fn record_out(&self) {
        self.records_out.fetch_add(1, Ordering::Relaxed);
        STAGE_RECORDS_OUT_TOTAL
            .with_label_values(&[self.stage_id.kind()])
            .inc();
    }

    /// Mark the worker as stopped. Only the first reason is kept.
    pub(crate) fn finish(&self, reason: StopReason) {
        let _ = self.stop_reason.set(reason);
        self.finished.store(true, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason.get().copied()
    }

    pub fn snapshot(&self) -> StageStatsSnapshot {
        StageStatsSnapshot {
            stage_id: self.stage_id.to_string(),
            records_in: self.records_in.load(Ordering::Relaxed),
            records_out: self.records_out.load(Ordering::Relaxed),
            finished: self.is_finished(),
            stop_reason: self.stop_reason(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageStatsSnapshot {
    pub stage_id: String,
    pub records_in: u64,
    pub records_out: u64,
    pub finished: bool,
    pub stop_reason: Option<StopReason>,
}

/// Marks the stats as finished when the worker returns, even if it panics.
pub(crate) struct FinishGuard {
    stats: Arc<StageStats>,
    reason: StopReason,
}

impl FinishGuard {
    pub(crate) fn new(stats: Arc<StageStats>) -> Self {
        Self {
            stats,
            reason: StopReason::Aborted,
        }
    }

    pub(crate) fn set_reason(&mut self, reason: StopReason) {
        self.reason = reason;
    }
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.stats.finish(self.reason);
    }
}
