//! Language-agnostic engine boundary.
//!
//! Core owns the values, models, frames and streams an engine module runs
//! against, and the module traits each language family implements.
//! Language-specific lifecycle glue lives in the language executors.

pub mod context;
pub mod model;
pub mod module;
pub mod profiler;
pub mod stream;
pub mod trace;
pub mod value;
