/// Scriptable engine module for exercising executors and controllers
/// without a real language engine.
use crate::config::types::{EngineError, EngineResult, Stage};
use crate::core::context::ModuleContext;
use crate::core::module::{
    ComparisonModule, GenerationModule, MergingModule, Module, ParseProblem, RuleModule,
    ScriptModule, TemplateModule, TransformationModule, ValidationModule,
};
use crate::core::profiler::{RuleProfiler, RuleTimer};
use crate::core::trace::{
    Constraint, ConstraintContext, MatchTrace, MergeTrace, TransformationTrace,
    UnsatisfiedConstraint,
};
use crate::core::value::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Ordered record of the calls a [`MockModule`] received
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    events: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    fn push(&self, event: &str) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.to_string()),
            Err(poisoned) => poisoned.into_inner().push(event.to_string()),
        }
    }

    pub fn events(&self) -> Vec<String> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }
}

/// Engine module whose results and failures are set up front
#[derive(Default)]
pub struct MockModule {
    context: ModuleContext,
    problems: Vec<ParseProblem>,
    problems_on_parse: Vec<ParseProblem>,
    failures: HashMap<Stage, String>,
    calls: CallLog,
    timer: RuleTimer,
    profiled: bool,
    rejects_parse: bool,
    value: Option<Value>,
    operations: HashMap<String, Value>,
    text: Option<String>,
    match_trace: MatchTrace,
    transformation_trace: TransformationTrace,
    merge_trace: MergeTrace,
    contexts: Vec<ConstraintContext>,
    unsatisfied: Vec<UnsatisfiedConstraint>,
}

impl MockModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    /// Report `problem` after the next parse, which still returns success
    pub fn with_parse_problem(mut self, problem: ParseProblem) -> Self {
        self.problems_on_parse.push(problem);
        self
    }

    /// Make parsing return `false` without reporting any problem
    pub fn rejecting_parse(mut self) -> Self {
        self.rejects_parse = true;
        self
    }

    /// Fail the given stage with an engine runtime fault
    pub fn failing_at<S: Into<String>>(mut self, stage: Stage, message: S) -> Self {
        self.failures.insert(stage, message.into());
        self
    }

    /// Expose a rule profiler reporting `elapsed` for `rule`
    pub fn with_rule_timing(mut self, rule: &str, elapsed: Duration) -> Self {
        self.profiled = true;
        self.timer.record(rule, elapsed);
        self
    }

    pub fn returning(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_operation<S: Into<String>>(mut self, name: S, result: Value) -> Self {
        self.operations.insert(name.into(), result);
        self
    }

    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_match_trace(mut self, trace: MatchTrace) -> Self {
        self.match_trace = trace;
        self
    }

    pub fn with_transformation_trace(mut self, trace: TransformationTrace) -> Self {
        self.transformation_trace = trace;
        self
    }

    pub fn with_merge_trace(mut self, trace: MergeTrace) -> Self {
        self.merge_trace = trace;
        self
    }

    pub fn with_constraint_context(mut self, context: ConstraintContext) -> Self {
        self.contexts.push(context);
        self
    }

    pub fn with_unsatisfied(mut self, unsatisfied: Vec<UnsatisfiedConstraint>) -> Self {
        self.unsatisfied = unsatisfied;
        self
    }

    fn stage(&mut self, stage: Stage) -> EngineResult<()> {
        self.calls.push(stage.as_str());
        match self.failures.get(&stage) {
            Some(message) => Err(EngineError::Runtime(message.clone())),
            None => Ok(()),
        }
    }

    fn parsed(&mut self) -> bool {
        self.problems = std::mem::take(&mut self.problems_on_parse);
        !self.rejects_parse
    }
}

impl Module for MockModule {
    fn parse_file(&mut self, path: &Path) -> EngineResult<bool> {
        self.calls.push("parse");
        std::fs::metadata(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.parsed())
    }

    fn parse_code(&mut self, _code: &str) -> EngineResult<bool> {
        self.calls.push("parse");
        Ok(self.parsed())
    }

    fn parse_problems(&self) -> &[ParseProblem] {
        &self.problems
    }

    fn context(&self) -> &ModuleContext {
        &self.context
    }

    fn context_mut(&mut self) -> &mut ModuleContext {
        &mut self.context
    }

    fn rule_profiler(&self) -> Option<&dyn RuleProfiler> {
        if self.profiled {
            Some(&self.timer)
        } else {
            None
        }
    }
}

impl RuleModule for MockModule {
    fn pre_process(&mut self) -> EngineResult<()> {
        self.stage(Stage::PreProcess)
    }

    fn post_process(&mut self) -> EngineResult<()> {
        self.stage(Stage::PostProcess)
    }
}

impl ScriptModule for MockModule {
    fn execute(&mut self) -> EngineResult<Value> {
        self.stage(Stage::Execute)?;
        Ok(self.value.clone().unwrap_or(Value::Null))
    }

    fn has_operation(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    fn invoke_operation(&mut self, name: &str, _arguments: &[Value]) -> EngineResult<Value> {
        self.stage(Stage::Execute)?;
        self.operations
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::Runtime(format!("no operation {name}")))
    }
}

impl ComparisonModule for MockModule {
    fn execute(&mut self) -> EngineResult<MatchTrace> {
        self.stage(Stage::Execute)?;
        Ok(self.match_trace.clone())
    }
}

impl TransformationModule for MockModule {
    fn execute(&mut self) -> EngineResult<TransformationTrace> {
        self.stage(Stage::Execute)?;
        Ok(self.transformation_trace.clone())
    }
}

impl MergingModule for MockModule {
    fn execute(&mut self) -> EngineResult<()> {
        self.stage(Stage::Execute)
    }

    fn match_trace(&self) -> MatchTrace {
        self.match_trace.clone()
    }

    fn merge_trace(&self) -> MergeTrace {
        self.merge_trace.clone()
    }
}

impl ValidationModule for MockModule {
    fn execute(&mut self) -> EngineResult<Vec<UnsatisfiedConstraint>> {
        self.stage(Stage::Execute)?;
        Ok(self.unsatisfied.clone())
    }

    fn constraints(&self) -> Vec<Constraint> {
        self.contexts
            .iter()
            .flat_map(|context| context.constraints.iter().cloned())
            .collect()
    }

    fn constraint_contexts(&self) -> Vec<ConstraintContext> {
        self.contexts.clone()
    }

    fn unsatisfied_constraints(&self) -> Vec<UnsatisfiedConstraint> {
        self.unsatisfied.clone()
    }
}

impl TemplateModule for MockModule {
    fn execute(&mut self) -> EngineResult<Option<String>> {
        self.stage(Stage::Execute)?;
        Ok(self.text.clone())
    }
}

impl GenerationModule for MockModule {
    fn execute(&mut self) -> EngineResult<Value> {
        self.stage(Stage::Execute)?;
        Ok(self.value.clone().unwrap_or(Value::Null))
    }
}
