//! Process-wide metrics for chanflow pipelines.

pub mod metrics;
pub mod runtime;

pub use metrics::{
    render_metrics, ActiveWorkerGuard, STAGE_RECORDS_IN_TOTAL, STAGE_RECORDS_OUT_TOTAL,
    STAGE_WORKERS_ACTIVE_GAUGE, TOKIO_TASKS_GAUGE,
};
pub use runtime::{active_stage_workers, spawn_runtime_sampler};
