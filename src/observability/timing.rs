//! Execution Time Data: stage and rule durations for one profiled run
//!
//! Pure bookkeeping. Re-starting a stage supersedes the earlier start,
//! re-ending overwrites the earlier duration, and ending a stage that was
//! never started records zero.

use crate::config::types::Stage;
use crate::core::profiler::RuleProfiler;
use crate::observability::metrics::get_metrics;
use crate::observability::probe::{EnvironmentProbe, HostMetadata};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

const SEPARATOR: &str = "----------------------------------------";

#[derive(Debug, Clone)]
pub struct ExecutionTimeData {
    host: HostMetadata,
    start: Option<Instant>,
    started_at: Option<DateTime<Local>>,
    finished_at: Option<DateTime<Local>>,
    stage_starts: HashMap<String, Instant>,
    stages: Vec<(String, Duration)>,
    rules: BTreeMap<String, Duration>,
    total: Option<Duration>,
    rule_overwrites: u64,
}

impl ExecutionTimeData {
    /// Capture host metadata now; timing starts at [`log_start`](Self::log_start).
    pub fn new(probe: &dyn EnvironmentProbe) -> Self {
        Self {
            host: probe.host_metadata(),
            start: None,
            started_at: None,
            finished_at: None,
            stage_starts: HashMap::new(),
            stages: Vec::new(),
            rules: BTreeMap::new(),
            total: None,
            rule_overwrites: 0,
        }
    }

    pub fn host(&self) -> &HostMetadata {
        &self.host
    }

    /// Mark the start of the run and log the host summary
    pub fn log_start(&mut self) {
        self.start = Some(Instant::now());
        let now = Local::now();
        self.started_at = Some(now);

        log::info!("Operating system: {}", self.host.os);
        log::info!("Runtime: {}", self.host.runtime);
        log::info!("CPU: {}", self.host.cpu);
        log::info!("Logical processors: {}", self.host.logical_processors);
        log::info!("Starting execution at {}", now.format("%Y-%m-%d %H:%M:%S%.3f"));
        log::info!("{}", SEPARATOR);
    }

    pub fn start_stage(&mut self, name: &str) {
        self.stage_starts.insert(name.to_string(), Instant::now());
    }

    /// Record elapsed time since the last start of `name`
    pub fn end_stage(&mut self, name: &str) -> Duration {
        let now = Instant::now();
        let started = self.stage_starts.get(name).copied().unwrap_or(now);
        let elapsed = now.saturating_duration_since(started);

        match self.stages.iter_mut().find(|(stage, _)| stage == name) {
            Some((_, duration)) => *duration = elapsed,
            None => self.stages.push((name.to_string(), elapsed)),
        }
        elapsed
    }

    /// Harvest rule timings, last write wins per rule name
    pub fn end_module(&mut self, profiler: Option<&dyn RuleProfiler>) {
        let Some(profiler) = profiler else {
            return;
        };
        for timing in profiler.rule_timings() {
            if self.rules.insert(timing.rule.clone(), timing.elapsed).is_some() {
                log::warn!("Value for rule {} was replaced.", timing.rule);
                self.rule_overwrites += 1;
                get_metrics().rule_overwrites.inc();
            }
        }
    }

    /// Close the run and log the profile
    pub fn log_end(&mut self) {
        let total = self
            .start
            .map(|start| start.elapsed())
            .unwrap_or(Duration::ZERO);
        self.total = Some(total);
        let now = Local::now();
        self.finished_at = Some(now);

        for line in self.summary().lines() {
            log::info!("{}", line);
        }
    }

    /// The human-readable profile
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str("Profiled processes:\n");
        for (stage, duration) in &self.stages {
            out.push_str(&format!("  {}:{}\n", stage, format_duration(*duration)));
        }
        out.push_str("Profiled rules:\n");
        for (rule, duration) in &self.rules {
            out.push_str(&format!("  {}:{}\n", rule, format_duration(*duration)));
        }
        if let Some(total) = self.total {
            out.push_str(&format!("Total duration: {}\n", format_duration(total)));
        }
        if let Some(finished) = self.finished_at {
            out.push_str(&format!(
                "Finished execution at {}\n",
                finished.format("%Y-%m-%d %H:%M:%S%.3f")
            ));
        }
        out.push_str(SEPARATOR);
        out
    }

    pub fn stage_duration(&self, name: &str) -> Option<Duration> {
        self.stages
            .iter()
            .find(|(stage, _)| stage == name)
            .map(|(_, duration)| *duration)
    }

    pub fn prepare_execution_duration(&self) -> Option<Duration> {
        self.stage_duration(Stage::PrepareExecution.as_str())
    }

    pub fn pre_process_duration(&self) -> Option<Duration> {
        self.stage_duration(Stage::PreProcess.as_str())
    }

    pub fn execute_duration(&self) -> Option<Duration> {
        self.stage_duration(Stage::Execute.as_str())
    }

    pub fn post_process_duration(&self) -> Option<Duration> {
        self.stage_duration(Stage::PostProcess.as_str())
    }

    pub fn total_duration(&self) -> Option<Duration> {
        self.total
    }

    pub fn rule_duration(&self, rule: &str) -> Option<Duration> {
        self.rules.get(rule).copied()
    }

    pub fn rule_durations(&self) -> impl Iterator<Item = (&str, Duration)> {
        self.rules.iter().map(|(rule, d)| (rule.as_str(), *d))
    }

    pub fn rule_overwrites(&self) -> u64 {
        self.rule_overwrites
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.start
    }

    pub fn stage_started_at(&self, name: &str) -> Option<Instant> {
        self.stage_starts.get(name).copied()
    }

    pub fn snapshot(&self) -> TimingSnapshot {
        TimingSnapshot {
            host: self.host.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
            stages_ms: self
                .stages
                .iter()
                .map(|(stage, d)| (stage.clone(), millis(*d)))
                .collect(),
            rules_ms: self
                .rules
                .iter()
                .map(|(rule, d)| (rule.clone(), millis(*d)))
                .collect(),
            total_ms: self.total.map(millis),
            rule_overwrites: self.rule_overwrites,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}

/// Serializable view of a profile
#[derive(Debug, Clone, Serialize)]
pub struct TimingSnapshot {
    pub host: HostMetadata,
    pub started_at: Option<DateTime<Local>>,
    pub finished_at: Option<DateTime<Local>>,
    pub stages_ms: BTreeMap<String, f64>,
    pub rules_ms: BTreeMap<String, f64>,
    pub total_ms: Option<f64>,
    pub rule_overwrites: u64,
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

fn format_duration(duration: Duration) -> String {
    format!("{:.3} ms", millis(duration))
}
