use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter_vec, register_int_gauge, register_int_gauge_vec, Encoder, IntCounterVec,
    IntGauge, IntGaugeVec, TextEncoder,
};

pub static TOKIO_TASKS_GAUGE: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "tokio_tasks_inflight",
        "Number of currently running Tokio spawn tasks"
    )
    .expect("create tokio task gauge")
});

pub static STAGE_WORKERS_ACTIVE_GAUGE: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "stage_workers_active",
        "Stage workers that have started and not yet closed their output",
        &["kind"]
    )
    .expect("create stage workers gauge vec")
});

pub static STAGE_RECORDS_IN_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "stage_records_in_total",
        "Values received by stage workers",
        &["kind"]
    )
    .expect("create stage records_in counter vec")
});

pub static STAGE_RECORDS_OUT_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "stage_records_out_total",
        "Values emitted by stage workers",
        &["kind"]
    )
    .expect("create stage records_out counter vec")
});

/// Keeps [`STAGE_WORKERS_ACTIVE_GAUGE`] incremented for as long as it is alive.
#[derive(Debug)]
pub struct ActiveWorkerGuard {
    gauge: IntGauge,
}

impl ActiveWorkerGuard {
    pub fn new(kind: &str) -> Self {
        let gauge = STAGE_WORKERS_ACTIVE_GAUGE.with_label_values(&[kind]);
        gauge.inc();
        Self { gauge }
    }
}

impl Drop for ActiveWorkerGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

/// Render every registered metric in the prometheus text exposition format.
pub fn render_metrics() -> String {
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    if TextEncoder::new().encode(&families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_guard_tracks_gauge() {
        let gauge = STAGE_WORKERS_ACTIVE_GAUGE.with_label_values(&["guard_test"]);
        assert_eq!(gauge.get(), 0);
        {
            let _first = ActiveWorkerGuard::new("guard_test");
            let _second = ActiveWorkerGuard::new("guard_test");
            assert_eq!(gauge.get(), 2);
        }
        assert_eq!(gauge.get(), 0);
    }

    #[test]
    fn render_includes_stage_counters() {
        STAGE_RECORDS_IN_TOTAL
            .with_label_values(&["render_test"])
            .inc_by(3);
        let text = render_metrics();
        assert!(text.contains("stage_records_in_total"));
        assert!(text.contains("render_test"));
    }
}
