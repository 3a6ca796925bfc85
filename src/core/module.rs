//! The engine module contract consumed by the language executors
//!
//! A module parses a program and runs it against a [`ModuleContext`]. Each
//! language family adds its own `execute` shape on top of [`Module`].

use crate::config::types::EngineResult;
use crate::core::context::ModuleContext;
use crate::core::profiler::RuleProfiler;
use crate::core::trace::{
    Constraint, ConstraintContext, MatchTrace, MergeTrace, TransformationTrace,
    UnsatisfiedConstraint,
};
use crate::core::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

/// A problem found while parsing, with its position in the source
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseProblem {
    pub line: usize,
    pub column: usize,
    pub reason: String,
    pub severity: Severity,
}

impl ParseProblem {
    pub fn error<S: Into<String>>(line: usize, column: usize, reason: S) -> Self {
        Self {
            line,
            column,
            reason: reason.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning<S: Into<String>>(line: usize, column: usize, reason: S) -> Self {
        Self {
            line,
            column,
            reason: reason.into(),
            severity: Severity::Warning,
        }
    }
}

impl fmt::Display for ParseProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.severity {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
        };
        write!(f, "{} at {}:{}: {}", kind, self.line, self.column, self.reason)
    }
}

/// Parsing and context access shared by every engine.
pub trait Module: Send {
    /// Parse a program file. `Err` when the file cannot be read.
    fn parse_file(&mut self, path: &Path) -> EngineResult<bool>;

    fn parse_code(&mut self, code: &str) -> EngineResult<bool>;

    fn parse_problems(&self) -> &[ParseProblem];

    fn context(&self) -> &ModuleContext;

    fn context_mut(&mut self) -> &mut ModuleContext;

    /// Rule timing, for rule-based engines only
    fn rule_profiler(&self) -> Option<&dyn RuleProfiler> {
        None
    }
}

/// Rule-based engines run hooks around their main pass.
pub trait RuleModule: Module {
    fn pre_process(&mut self) -> EngineResult<()>;

    fn post_process(&mut self) -> EngineResult<()>;
}

/// General expression language: whole program or one operation
pub trait ScriptModule: Module {
    fn execute(&mut self) -> EngineResult<Value>;

    fn has_operation(&self, name: &str) -> bool;

    fn invoke_operation(&mut self, name: &str, arguments: &[Value]) -> EngineResult<Value>;
}

pub trait ComparisonModule: RuleModule {
    fn execute(&mut self) -> EngineResult<MatchTrace>;
}

pub trait TransformationModule: RuleModule {
    fn execute(&mut self) -> EngineResult<TransformationTrace>;
}

/// Merging composes a comparison pass with a transformation pass
pub trait MergingModule: RuleModule {
    fn execute(&mut self) -> EngineResult<()>;

    fn match_trace(&self) -> MatchTrace;

    fn merge_trace(&self) -> MergeTrace;
}

pub trait ValidationModule: RuleModule {
    fn execute(&mut self) -> EngineResult<Vec<UnsatisfiedConstraint>>;

    fn constraints(&self) -> Vec<Constraint>;

    fn constraint_contexts(&self) -> Vec<ConstraintContext>;

    fn unsatisfied_constraints(&self) -> Vec<UnsatisfiedConstraint>;
}

/// Template language producing text
pub trait TemplateModule: Module {
    fn execute(&mut self) -> EngineResult<Option<String>>;
}

/// Rule-driven generation, usually writing files as a side effect
pub trait GenerationModule: RuleModule {
    fn execute(&mut self) -> EngineResult<Value>;
}
