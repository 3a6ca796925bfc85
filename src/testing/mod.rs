//! Testing infrastructure
//!
//! Scriptable engine modules for exercising executors and controllers.

pub mod mock_module;

pub use mock_module::*;
