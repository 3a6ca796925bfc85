// Process-wide run metrics
//
// Counters for run outcomes by error kind, disposals and rule overwrites,
// a gauge of in-flight runs, and latency histograms per lifecycle stage.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::types::{ScriptError, Stage};

/// Counter metric (monotonically increasing)
#[derive(Debug)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, delta: u64) {
        self.value.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

/// Gauge metric (can go up or down)
#[derive(Debug)]
pub struct Gauge {
    value: AtomicU64,
}

impl Gauge {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        // saturate at zero
        let _ = self
            .value
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| Some(v.saturating_sub(1)));
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Default for Gauge {
    fn default() -> Self {
        Self::new()
    }
}

/// Histogram bucket for latency tracking
#[derive(Debug)]
pub struct HistogramBucket {
    pub le: f64, // upper bound in seconds
    pub count: AtomicU64,
}

/// Histogram metric for latency/duration tracking
#[derive(Debug)]
pub struct Histogram {
    buckets: Vec<HistogramBucket>,
    sum: AtomicU64, // microseconds
    count: AtomicU64,
}

impl Histogram {
    /// Buckets from 100us to 10s, scripts are usually fast
    pub fn new_latency() -> Self {
        let bucket_bounds = [
            0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0,
        ];

        let buckets = bucket_bounds
            .into_iter()
            .map(|le| HistogramBucket {
                le,
                count: AtomicU64::new(0),
            })
            .collect();

        Self {
            buckets,
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    pub fn observe(&self, value: Duration) {
        let seconds = value.as_secs_f64();
        let micros = value.as_micros() as u64;

        self.sum.fetch_add(micros, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for bucket in &self.buckets {
            if seconds <= bucket.le {
                bucket.count.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn get_count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn get_sum_micros(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn get_bucket_count(&self, le: f64) -> u64 {
        self.buckets
            .iter()
            .find(|b| (b.le - le).abs() < 0.000_01)
            .map(|b| b.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn write_prometheus(&self, output: &mut String, name: &str, labels: &str) {
        let sep = if labels.is_empty() { "" } else { "," };
        for bucket in &self.buckets {
            output.push_str(&format!(
                "{}_bucket{{{}{}le=\"{}\"}} {}\n",
                name,
                labels,
                sep,
                bucket.le,
                bucket.count.load(Ordering::Relaxed)
            ));
        }
        let braces = if labels.is_empty() {
            String::new()
        } else {
            format!("{{{}}}", labels)
        };
        output.push_str(&format!(
            "{}_sum{} {}\n",
            name,
            braces,
            self.get_sum_micros() as f64 / 1_000_000.0
        ));
        output.push_str(&format!("{}_count{} {}\n", name, braces, self.get_count()));
    }
}

/// Run metrics registry
#[derive(Debug)]
pub struct MetricsRegistry {
    pub runs_total: Counter,
    pub runs_succeeded: Counter,
    pub config_failures: Counter,
    pub parse_failures: Counter,
    pub execution_failures: Counter,
    pub stage_failures: Counter,
    pub other_failures: Counter,

    pub rule_overwrites: Counter,
    pub disposals: Counter,

    pub active_runs: Gauge,

    pub run_latency: Histogram,
    pub prepare_latency: Histogram,
    pub pre_process_latency: Histogram,
    pub execute_latency: Histogram,
    pub post_process_latency: Histogram,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            runs_total: Counter::new(),
            runs_succeeded: Counter::new(),
            config_failures: Counter::new(),
            parse_failures: Counter::new(),
            execution_failures: Counter::new(),
            stage_failures: Counter::new(),
            other_failures: Counter::new(),
            rule_overwrites: Counter::new(),
            disposals: Counter::new(),
            active_runs: Gauge::new(),
            run_latency: Histogram::new_latency(),
            prepare_latency: Histogram::new_latency(),
            pre_process_latency: Histogram::new_latency(),
            execute_latency: Histogram::new_latency(),
            post_process_latency: Histogram::new_latency(),
        }
    }

    pub fn stage_latency(&self, stage: Stage) -> &Histogram {
        match stage {
            Stage::PrepareExecution => &self.prepare_latency,
            Stage::PreProcess => &self.pre_process_latency,
            Stage::Execute => &self.execute_latency,
            Stage::PostProcess => &self.post_process_latency,
        }
    }

    pub fn record_run_start(&self) {
        self.runs_total.inc();
        self.active_runs.inc();
    }

    pub fn record_success(&self, elapsed: Duration) {
        self.active_runs.dec();
        self.runs_succeeded.inc();
        self.run_latency.observe(elapsed);
    }

    /// Classify a failed run by error kind
    pub fn record_failure(&self, error: &ScriptError, elapsed: Duration) {
        self.active_runs.dec();
        self.run_latency.observe(elapsed);
        match error {
            ScriptError::Config(_) => self.config_failures.inc(),
            ScriptError::Parse { .. } => self.parse_failures.inc(),
            ScriptError::Execution { .. } => self.execution_failures.inc(),
            ScriptError::Stage { .. } => self.stage_failures.inc(),
            _ => self.other_failures.inc(),
        }
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();

        output.push_str("# HELP scriptbox_runs_total Total number of controller runs\n");
        output.push_str("# TYPE scriptbox_runs_total counter\n");
        output.push_str(&format!("scriptbox_runs_total {}\n", self.runs_total.get()));

        output.push_str("# HELP scriptbox_runs_by_outcome Runs by outcome\n");
        output.push_str("# TYPE scriptbox_runs_by_outcome counter\n");
        for (outcome, counter) in [
            ("ok", &self.runs_succeeded),
            ("config", &self.config_failures),
            ("parse", &self.parse_failures),
            ("execution", &self.execution_failures),
            ("stage", &self.stage_failures),
            ("other", &self.other_failures),
        ] {
            output.push_str(&format!(
                "scriptbox_runs_by_outcome{{outcome=\"{}\"}} {}\n",
                outcome,
                counter.get()
            ));
        }

        output.push_str("# HELP scriptbox_rule_overwrites_total Rule timings replaced by a later harvest\n");
        output.push_str("# TYPE scriptbox_rule_overwrites_total counter\n");
        output.push_str(&format!(
            "scriptbox_rule_overwrites_total {}\n",
            self.rule_overwrites.get()
        ));

        output.push_str("# HELP scriptbox_disposals_total Controller disposals\n");
        output.push_str("# TYPE scriptbox_disposals_total counter\n");
        output.push_str(&format!("scriptbox_disposals_total {}\n", self.disposals.get()));

        output.push_str("# HELP scriptbox_active_runs Currently running controllers\n");
        output.push_str("# TYPE scriptbox_active_runs gauge\n");
        output.push_str(&format!("scriptbox_active_runs {}\n", self.active_runs.get()));

        output.push_str("# HELP scriptbox_run_latency_seconds End-to-end run latency\n");
        output.push_str("# TYPE scriptbox_run_latency_seconds histogram\n");
        self.run_latency
            .write_prometheus(&mut output, "scriptbox_run_latency_seconds", "");

        output.push_str("# HELP scriptbox_stage_latency_seconds Latency per lifecycle stage\n");
        output.push_str("# TYPE scriptbox_stage_latency_seconds histogram\n");
        for stage in Stage::ALL {
            self.stage_latency(stage).write_prometheus(
                &mut output,
                "scriptbox_stage_latency_seconds",
                &format!("stage=\"{}\"", stage.as_str()),
            );
        }

        output
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global metrics instance
static METRICS: once_cell::sync::Lazy<Arc<MetricsRegistry>> =
    once_cell::sync::Lazy::new(|| Arc::new(MetricsRegistry::new()));

/// Get global metrics registry
pub fn get_metrics() -> Arc<MetricsRegistry> {
    Arc::clone(&METRICS)
}
