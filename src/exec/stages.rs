use crate::config::types::{Result, ScriptError, SourceRef, Stage};
use crate::core::context::NativeTypeDelegate;
use crate::core::model::ModelHandle;
use crate::core::value::Parameters;
use crate::language::executor::LanguageExecutor;
use crate::observability::metrics::get_metrics;
use crate::observability::timing::ExecutionTimeData;
/// Type-State Stage Chain
///
/// A run is a fixed sequence and must not drift:
/// 1. parse the script (or the inline code) and reject outstanding problems
/// 2. prepareExecution: register models, parameters and native delegates
/// 3. preProcess
/// 4. execute, producing the language's result
/// 5. postProcess
/// 6. harvest rule timings and close the profile
///
/// Each step consumes the prior state and returns exactly one next state on
/// success, so a stage cannot be skipped, reordered or repeated.
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

const EXECUTION_FAILED: &str = "Error executing the module.";

/// Type-state marker: nothing parsed yet
pub struct Constructed;

/// Type-state marker: source parsed without problems
pub struct Parsed;

/// Type-state marker: models, parameters and delegates registered
pub struct Prepared;

/// Type-state marker: engine pre-processing done
pub struct PreProcessed;

/// Type-state marker: engine produced its result
pub struct Executed;

/// Type-state marker: engine post-processing done
pub struct PostProcessed;

/// One pass over an executor with type-state tracking
///
/// ```
/// use scriptbox::config::types::SourceRef;
/// use scriptbox::exec::stages::Execution;
/// use scriptbox::language::languages::etl::TransformationExecutor;
/// use scriptbox::testing::MockModule;
/// use std::collections::HashMap;
///
/// let mut executor = TransformationExecutor::new(MockModule::new());
/// let (executed, _trace) = Execution::new(&mut executor, None)
///     .parse(SourceRef::Code("rule A {}"))?
///     .prepare(&[], &HashMap::new(), &[])
///     .pre_process()?
///     .execute()?;
/// executed.post_process()?.finish();
/// # Ok::<(), scriptbox::ScriptError>(())
/// ```
///
/// Executing before parsing does not compile:
///
/// ```compile_fail
/// # use scriptbox::exec::stages::Execution;
/// # use scriptbox::language::languages::etl::TransformationExecutor;
/// # use scriptbox::testing::MockModule;
/// let mut executor = TransformationExecutor::new(MockModule::new());
/// let _ = Execution::new(&mut executor, None).execute();
/// ```
///
/// Neither does skipping prepareExecution:
///
/// ```compile_fail
/// # use scriptbox::config::types::SourceRef;
/// # use scriptbox::exec::stages::Execution;
/// # use scriptbox::language::languages::etl::TransformationExecutor;
/// # use scriptbox::testing::MockModule;
/// let mut executor = TransformationExecutor::new(MockModule::new());
/// let parsed = Execution::new(&mut executor, None)
///     .parse(SourceRef::Code("rule A {}"))
///     .unwrap();
/// let _ = parsed.pre_process();
/// ```
///
/// ```compile_fail
/// # use scriptbox::config::types::SourceRef;
/// # use scriptbox::exec::stages::Execution;
/// # use scriptbox::language::languages::etl::TransformationExecutor;
/// # use scriptbox::testing::MockModule;
/// let mut executor = TransformationExecutor::new(MockModule::new());
/// let parsed = Execution::new(&mut executor, None)
///     .parse(SourceRef::Code("rule A {}"))
///     .unwrap();
/// let _ = parsed.execute();
/// ```
///
/// Or finishing before postProcess:
///
/// ```compile_fail
/// # use scriptbox::config::types::SourceRef;
/// # use scriptbox::exec::stages::Execution;
/// # use scriptbox::language::languages::etl::TransformationExecutor;
/// # use scriptbox::testing::MockModule;
/// # use std::collections::HashMap;
/// let mut executor = TransformationExecutor::new(MockModule::new());
/// let (executed, _) = Execution::new(&mut executor, None)
///     .parse(SourceRef::Code("rule A {}"))
///     .unwrap()
///     .prepare(&[], &HashMap::new(), &[])
///     .pre_process()
///     .unwrap()
///     .execute()
///     .unwrap();
/// executed.finish();
/// ```
///
/// Or executing twice:
///
/// ```compile_fail
/// # use scriptbox::config::types::SourceRef;
/// # use scriptbox::exec::stages::Execution;
/// # use scriptbox::language::languages::etl::TransformationExecutor;
/// # use scriptbox::testing::MockModule;
/// # use std::collections::HashMap;
/// let mut executor = TransformationExecutor::new(MockModule::new());
/// let (executed, _) = Execution::new(&mut executor, None)
///     .parse(SourceRef::Code("rule A {}"))
///     .unwrap()
///     .prepare(&[], &HashMap::new(), &[])
///     .pre_process()
///     .unwrap()
///     .execute()
///     .unwrap();
/// let _ = executed.execute();
/// ```
///
/// Or reusing a consumed state:
///
/// ```compile_fail
/// # use scriptbox::config::types::SourceRef;
/// # use scriptbox::exec::stages::Execution;
/// # use scriptbox::language::languages::etl::TransformationExecutor;
/// # use scriptbox::testing::MockModule;
/// let mut executor = TransformationExecutor::new(MockModule::new());
/// let execution = Execution::new(&mut executor, None);
/// let _parsed = execution.parse(SourceRef::Code("rule A {}"));
/// let _again = execution.parse(SourceRef::Code("rule B {}"));
/// ```
pub struct Execution<'a, E: LanguageExecutor, S> {
    executor: &'a mut E,
    timing: Option<&'a mut ExecutionTimeData>,
    _state: PhantomData<S>,
}

impl<'a, E: LanguageExecutor, S> Execution<'a, E, S> {
    fn advance<T>(self) -> Execution<'a, E, T> {
        Execution {
            executor: self.executor,
            timing: self.timing,
            _state: PhantomData,
        }
    }

    pub fn is_profiled(&self) -> bool {
        self.timing.is_some()
    }

    /// Run `body` inside the profiling span of `stage`. The span is closed
    /// whatever the outcome.
    fn span<T>(&mut self, stage: Stage, body: impl FnOnce(&mut E) -> T) -> T {
        let started = Instant::now();
        if let Some(timing) = self.timing.as_deref_mut() {
            timing.start_stage(stage.as_str());
        }

        let outcome = body(&mut *self.executor);

        if let Some(timing) = self.timing.as_deref_mut() {
            timing.end_stage(stage.as_str());
        }
        get_metrics().stage_latency(stage).observe(started.elapsed());
        outcome
    }
}

impl<'a, E: LanguageExecutor> Execution<'a, E, Constructed> {
    pub fn new(executor: &'a mut E, timing: Option<&'a mut ExecutionTimeData>) -> Self {
        Self {
            executor,
            timing,
            _state: PhantomData,
        }
    }

    /// Parse the source. A parse that reports problems fails even when the
    /// engine itself returned success.
    pub fn parse(self, source: SourceRef<'_>) -> Result<Execution<'a, E, Parsed>> {
        let culprit = source.kind();
        let parsed = match source {
            SourceRef::Script(path) => self.executor.parse_file(path),
            SourceRef::Code(code) => self.executor.parse_code(code),
        };

        let accepted = match parsed {
            Ok(accepted) => accepted,
            Err(e) => {
                log::error!("Failed to parse provided {}", culprit);
                return Err(ScriptError::Parse {
                    culprit,
                    summary: e.to_string(),
                    problems: Vec::new(),
                    source: Some(e),
                });
            }
        };

        let problems = self.executor.parse_problems();
        if !problems.is_empty() {
            for problem in problems {
                log::error!("{}", problem);
            }
            log::error!("Parse errors occurred.");
            let summary = problems
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ScriptError::Parse {
                culprit,
                summary,
                problems: problems.to_vec(),
                source: None,
            });
        }

        if !accepted {
            log::error!("Failed to parse provided {}", culprit);
            return Err(ScriptError::Parse {
                culprit,
                summary: format!("the engine rejected the {}", culprit),
                problems: Vec::new(),
                source: None,
            });
        }

        Ok(self.advance())
    }
}

impl<'a, E: LanguageExecutor> Execution<'a, E, Parsed> {
    /// Register the run's inputs with the executor
    pub fn prepare(
        mut self,
        models: &[ModelHandle],
        parameters: &Parameters,
        delegates: &[Arc<dyn NativeTypeDelegate>],
    ) -> Execution<'a, E, Prepared> {
        self.span(Stage::PrepareExecution, |executor| {
            executor.add_models(models);
            executor.add_parameters(parameters);
            executor.add_native_type_delegates(delegates);
        });
        self.advance()
    }
}

impl<'a, E: LanguageExecutor> Execution<'a, E, Prepared> {
    pub fn pre_process(mut self) -> Result<Execution<'a, E, PreProcessed>> {
        self.span(Stage::PreProcess, |executor| executor.pre_process())
            .map_err(|e| with_stage(Stage::PreProcess, e))?;
        Ok(self.advance())
    }
}

impl<'a, E: LanguageExecutor> Execution<'a, E, PreProcessed> {
    /// Execute the program, handing back the language's result
    pub fn execute(mut self) -> Result<(Execution<'a, E, Executed>, E::Output)> {
        let output = self
            .span(Stage::Execute, |executor| executor.execute())
            .map_err(|e| match e {
                ScriptError::Engine(source) => {
                    log::error!("{} {}", EXECUTION_FAILED, source);
                    ScriptError::Execution {
                        message: EXECUTION_FAILED.to_string(),
                        source,
                    }
                }
                other => other,
            })?;
        Ok((self.advance(), output))
    }
}

impl<'a, E: LanguageExecutor> Execution<'a, E, Executed> {
    pub fn post_process(mut self) -> Result<Execution<'a, E, PostProcessed>> {
        self.span(Stage::PostProcess, |executor| executor.post_process())
            .map_err(|e| with_stage(Stage::PostProcess, e))?;
        Ok(self.advance())
    }
}

impl<'a, E: LanguageExecutor> Execution<'a, E, PostProcessed> {
    /// Merge the engine's rule timings and close the profile
    pub fn finish(self) {
        if let Some(timing) = self.timing {
            timing.end_module(self.executor.rule_profiler());
            timing.log_end();
        }
    }
}

fn with_stage(stage: Stage, error: ScriptError) -> ScriptError {
    match error {
        ScriptError::Engine(source) => {
            log::error!("{} failed: {}", stage, source);
            ScriptError::Stage { stage, source }
        }
        other => other,
    }
}

#[cfg(test)]
mod typestate_tests {
    use super::*;
    use crate::config::types::EngineError;
    use crate::core::module::ParseProblem;
    use crate::core::value::{Parameters, Value};
    use crate::language::languages::etl::TransformationExecutor;
    use crate::observability::probe::{FixedProbe, HostMetadata};
    use crate::testing::MockModule;
    use std::collections::HashMap;
    use std::path::Path;
    use std::time::Duration;

    fn timing() -> ExecutionTimeData {
        ExecutionTimeData::new(&FixedProbe::new(HostMetadata {
            os: "TestOS".to_string(),
            runtime: "test".to_string(),
            cpu: "cpu".to_string(),
            logical_processors: 1,
        }))
    }

    #[test]
    fn test_chain_happy_path() {
        let module = MockModule::new();
        let calls = module.calls();
        let mut executor = TransformationExecutor::new(module);

        let parsed = Execution::new(&mut executor, None)
            .parse(SourceRef::Code("rule A {}"))
            .unwrap();
        let prepared = parsed.prepare(&[], &HashMap::new(), &[]);
        let (executed, trace) = prepared.pre_process().unwrap().execute().unwrap();
        executed.post_process().unwrap().finish();

        assert!(trace.is_empty());
        assert_eq!(
            calls.events(),
            vec!["parse", "preProcess", "execute", "postProcess"]
        );
    }

    #[test]
    fn test_problems_fail_a_successful_parse() {
        let module = MockModule::new().with_parse_problem(ParseProblem::error(3, 4, "unknown type Foo"));
        let mut executor = TransformationExecutor::new(module);

        let err = Execution::new(&mut executor, None)
            .parse(SourceRef::Code("rule A {}"))
            .err()
            .unwrap();
        assert!(err.is_parse());
        assert_eq!(err.parse_problems().len(), 1);
        assert!(err.to_string().contains("Failed to parse provided code"));
    }

    #[test]
    fn test_rejected_parse_without_problems_is_parse_error() {
        let module = MockModule::new().rejecting_parse();
        let calls = module.calls();
        let mut executor = TransformationExecutor::new(module);

        let err = Execution::new(&mut executor, None)
            .parse(SourceRef::Code("rule A {}"))
            .err()
            .unwrap();
        match err {
            ScriptError::Parse {
                summary,
                problems,
                source,
                ..
            } => {
                assert_eq!(summary, "the engine rejected the code");
                assert!(problems.is_empty());
                assert!(source.is_none());
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(calls.events(), vec!["parse"]);
    }

    #[test]
    fn test_unreadable_script_is_parse_error() {
        let mut executor = TransformationExecutor::new(MockModule::new());
        let err = Execution::new(&mut executor, None)
            .parse(SourceRef::Script(Path::new("/no/such/file.etl")))
            .err()
            .unwrap();
        match err {
            ScriptError::Parse {
                culprit, source, ..
            } => {
                assert_eq!(culprit.to_string(), "script");
                assert!(matches!(source, Some(EngineError::Io { .. })));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_execute_fault_is_wrapped_and_span_closed() {
        let module = MockModule::new().failing_at(Stage::Execute, "boom");
        let mut executor = TransformationExecutor::new(module);
        let mut data = timing();

        let pre = Execution::new(&mut executor, Some(&mut data))
            .parse(SourceRef::Code("x"))
            .unwrap()
            .prepare(&[], &HashMap::new(), &[])
            .pre_process()
            .unwrap();
        let err = pre.execute().err().unwrap();

        assert!(err.is_execution());
        assert_eq!(err.to_string(), "Error executing the module.: boom");
        assert!(data.execute_duration().is_some());
    }

    #[test]
    fn test_pre_process_fault_carries_stage() {
        let module = MockModule::new().failing_at(Stage::PreProcess, "no hooks");
        let mut executor = TransformationExecutor::new(module);

        let err = Execution::new(&mut executor, None)
            .parse(SourceRef::Code("x"))
            .unwrap()
            .prepare(&[], &HashMap::new(), &[])
            .pre_process()
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ScriptError::Stage {
                stage: Stage::PreProcess,
                ..
            }
        ));
    }

    #[test]
    fn test_finish_harvests_rules() {
        let module = MockModule::new().with_rule_timing("Class2Table", Duration::from_millis(4));
        let mut executor = TransformationExecutor::new(module);
        let mut data = timing();

        let parameters: Parameters = HashMap::from([("limit".to_string(), Value::Integer(3).into())]);
        let (executed, _) = Execution::new(&mut executor, Some(&mut data))
            .parse(SourceRef::Code("x"))
            .unwrap()
            .prepare(&[], &parameters, &[])
            .pre_process()
            .unwrap()
            .execute()
            .unwrap();
        executed.post_process().unwrap().finish();

        assert_eq!(
            data.rule_duration("Class2Table"),
            Some(Duration::from_millis(4))
        );
        assert!(data.total_duration().is_some());
        assert!(data.prepare_execution_duration().is_some());
    }
}
