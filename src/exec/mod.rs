//! Execution control
//!
//! Drives language executors through the parse, prepare, pre-process,
//! execute and post-process stages with type-state enforcement.

pub mod controller;
pub mod handle;
pub mod stages;

pub use controller::{ControllerBuilder, ExecutionController};
pub use handle::{DeferredRun, RunHandle, RunOutcome};
