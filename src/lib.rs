//! scriptbox: a lifecycle controller for model-management scripting engines
//! Runs programs written in one of several scripting languages against a set
//! of models, with a fixed stage order and optional profiling.
//!
//! # Architecture
//!
//! This crate is organized by concern:
//!
//! ## Execution Control ([`exec`])
//! - [`exec::controller`]: Execution controller and its builder
//! - [`exec::stages`]: Type-state enforced stage ordering
//! - [`exec::handle`]: One-shot asynchronous runs
//!
//! ## Language Executors ([`language`])
//! - [`language::executor`]: The uniform executor contract
//! - [`language::adapter`]: Module adapter shared by every language
//! - [`language::languages`]: One executor per language
//! - [`language::registry`]: Language names, aliases and file extensions
//!
//! ## Engine Boundary ([`core`])
//! - [`core::value`]: Dynamically typed values and read-only bindings
//! - [`core::model`]: Models, the model repository and model builders
//! - [`core::context`]: Module context, frame stack and native delegates
//! - [`core::module`]: Module traits per language family
//! - [`core::trace`]: Match, transformation, merge and validation records
//!
//! ## Reference Engine ([`engine`])
//! - A small expression language used to drive the controller end to end
//!
//! ## Observability ([`observability`])
//! - [`observability::timing`]: Execution Time Data
//! - [`observability::probe`]: Injectable host metadata
//! - [`observability::metrics`]: Prometheus metrics export
//!
//! ## Configuration ([`config`])
//! - [`config::types`]: Shared type definitions, closed enums and errors
//! - [`config::options`]: Execution options
//! - [`config::validator`]: Pre-run input validation
//! - [`config::paths`]: Script path resolution
//!
//! ## Reports ([`report`])
//! - [`report::unsatisfied`]: Unsatisfied constraint renderings
//!
//! ## Testing Infrastructure ([`testing`])
//! - [`testing::mock_module`]: Scriptable module double for every language
//!
//! # Design Principles
//!
//! 1. **Stages are fixed** - Parse, prepare, pre-process, execute, post-process
//! 2. **Types prevent errors** - A skipped or repeated stage does not compile
//! 3. **Failures carry context** - Every fault names the stage it came from
//! 4. **Disposal is explicit** - Nothing is released behind the caller's back

// Execution Control
pub mod exec;

// Language executors
pub mod language;

// Engine boundary
pub mod core;

// Reference engine
pub mod engine;

// Observability
pub mod observability;

// Configuration
pub mod config;

// Reports
pub mod report;

// Testing Infrastructure
pub mod testing;

// Re-export commonly used types for convenience
pub use config::types::*;
pub use exec::{ExecutionController, RunOutcome};
pub use language::executor::LanguageExecutor;
