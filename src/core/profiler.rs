//! Per-rule timing exposed by rule-based engines

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Elapsed time of one named rule
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleTiming {
    pub rule: String,
    pub elapsed: Duration,
}

/// Capability of rule-based engines: how long each named rule took.
pub trait RuleProfiler {
    fn rule_timings(&self) -> Vec<RuleTiming>;
}

/// Accumulates time per rule name, usable by any engine
#[derive(Debug, Default)]
pub struct RuleTimer {
    elapsed: HashMap<String, Duration>,
    running: HashMap<String, Instant>,
}

impl RuleTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, rule: &str) {
        self.running.insert(rule.to_string(), Instant::now());
    }

    pub fn stop(&mut self, rule: &str) {
        if let Some(started) = self.running.remove(rule) {
            self.record(rule, started.elapsed());
        }
    }

    /// Add time to a rule, summing repeated executions
    pub fn record(&mut self, rule: &str, elapsed: Duration) {
        *self.elapsed.entry(rule.to_string()).or_default() += elapsed;
    }

    pub fn reset(&mut self) {
        self.elapsed.clear();
        self.running.clear();
    }
}

impl RuleProfiler for RuleTimer {
    fn rule_timings(&self) -> Vec<RuleTiming> {
        let mut timings: Vec<RuleTiming> = self
            .elapsed
            .iter()
            .map(|(rule, elapsed)| RuleTiming {
                rule: rule.clone(),
                elapsed: *elapsed,
            })
            .collect();
        timings.sort_by(|a, b| a.rule.cmp(&b.rule));
        timings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sums_per_rule() {
        let mut timer = RuleTimer::new();
        timer.record("Copy", Duration::from_millis(2));
        timer.record("Copy", Duration::from_millis(3));
        timer.record("Align", Duration::from_millis(1));

        let timings = timer.rule_timings();
        assert_eq!(
            timings,
            vec![
                RuleTiming {
                    rule: "Align".to_string(),
                    elapsed: Duration::from_millis(1)
                },
                RuleTiming {
                    rule: "Copy".to_string(),
                    elapsed: Duration::from_millis(5)
                },
            ]
        );
    }

    #[test]
    fn test_stop_without_start_records_nothing() {
        let mut timer = RuleTimer::new();
        timer.stop("Ghost");
        assert!(timer.rule_timings().is_empty());
    }
}
