//! Reports
//!
//! Log and bordered-text renderings of validation results.

pub mod unsatisfied;
