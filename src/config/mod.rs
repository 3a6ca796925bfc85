//! Configuration
//!
//! Execution options, input validation, path resolution and shared types.

pub mod options;
pub mod paths;
pub mod types;
pub mod validator;
