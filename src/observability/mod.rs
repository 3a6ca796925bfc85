//! Observability
//!
//! Execution profiling, host metadata and process-wide metrics.

pub mod metrics;
pub mod probe;
pub mod timing;
