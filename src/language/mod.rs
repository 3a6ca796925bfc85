//! Language executors.
//!
//! The controller stays language-agnostic. Each executor wraps one engine
//! module behind [`executor::LanguageExecutor`] and supplies that language's
//! stage semantics and result type.

#[macro_use]
pub mod adapter;
pub mod executor;
pub mod languages;
pub mod registry;
