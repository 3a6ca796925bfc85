//! Integration tests for the execution controller
//!
//! These tests drive whole runs through real and scripted engines and check
//! stage ordering, error classification and disposal.

use scriptbox::config::paths::BasePathResolver;
use scriptbox::config::types::{EngineError, LifecycleState, ScriptError, Stage};
use scriptbox::core::context::NativeTypeDelegate;
use scriptbox::core::model::{InMemoryModel, Model, ModelHandle};
use scriptbox::core::module::{Module, ParseProblem};
use scriptbox::core::stream::Stream;
use scriptbox::core::trace::{Constraint, UnsatisfiedConstraint};
use scriptbox::core::value::Value;
use scriptbox::engine::ScriptEngine;
use scriptbox::exec::ExecutionController;
use scriptbox::language::adapter::ModuleAdapter;
use scriptbox::language::languages::ecl::ComparisonExecutor;
use scriptbox::language::languages::eol::ScriptExecutor;
use scriptbox::language::languages::evl::ValidationExecutor;
use scriptbox::language::registry::Language;
use scriptbox::observability::metrics::get_metrics;
use scriptbox::observability::probe::{FixedProbe, HostMetadata};
use scriptbox::report::unsatisfied::{print_unsatisfied, CONSTRAINT_MARKER, CRITIQUE_MARKER};
use scriptbox::testing::MockModule;
use std::error::Error;
use std::sync::Arc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn probe() -> Arc<FixedProbe> {
    Arc::new(FixedProbe::new(HostMetadata {
        os: "TestOS".to_string(),
        runtime: "test".to_string(),
        cpu: "cpu".to_string(),
        logical_processors: 8,
    }))
}

#[test]
fn test_missing_source_fails_before_any_stage() {
    init_logging();
    let module = MockModule::new();
    let calls = module.calls();
    let mut controller = ExecutionController::builder(ScriptExecutor::new(module)).build();

    let err = controller.run().unwrap_err();
    assert!(err.is_config(), "unexpected error: {}", err);
    assert!(calls.events().is_empty());
}

#[test]
fn test_problems_fail_run_despite_parse_success() {
    init_logging();
    let module = MockModule::new().with_parse_problem(ParseProblem::error(2, 5, "unknown type Foo"));
    let calls = module.calls();
    let mut controller = ExecutionController::for_code(ScriptExecutor::new(module), "x");

    let err = controller.run().unwrap_err();
    assert!(err.is_parse());
    assert_eq!(err.parse_problems()[0].reason, "unknown type Foo");
    assert_eq!(calls.events(), vec!["parse"]);
}

#[test]
fn test_syntax_errors_become_parse_problems() {
    init_logging();
    let mut controller =
        ExecutionController::for_code(ScriptExecutor::new(ScriptEngine::new()), "return 1 +;");

    let err = controller.run().unwrap_err();
    let problems = err.parse_problems();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].line, 1);
    assert!(err.to_string().starts_with("Failed to parse provided code"));
}

#[test]
fn test_deeply_nested_program_fails_the_run() {
    init_logging();
    for n in [500, 2_000, 20_000] {
        let code = format!("return {}1{};", "(".repeat(n), ")".repeat(n));
        let mut controller =
            ExecutionController::for_code(ScriptExecutor::new(ScriptEngine::new()), code);

        let err = controller.run().unwrap_err();
        assert!(err.is_parse(), "unexpected error: {}", err);
        assert!(err.parse_problems()[0]
            .reason
            .contains("expression nested too deeply"));
        assert_eq!(controller.state(), LifecycleState::Failed);
    }
}

#[test]
fn test_operation_invocation_returns_42() {
    init_logging();
    let executor = ScriptExecutor::for_operation(ScriptEngine::new(), "foo", Vec::new());
    let mut controller =
        ExecutionController::for_code(executor, "operation foo() { return 40+2; }");

    assert_eq!(controller.run().unwrap(), Value::Integer(42));
    assert_eq!(controller.state(), LifecycleState::PostProcessed);
}

#[test]
fn test_operation_mode_without_name_is_invalid_mode() {
    init_logging();
    let executor = ScriptExecutor::operation_mode(ScriptEngine::new());
    let mut controller =
        ExecutionController::for_code(executor, "operation foo() { return 1; }");

    let err = controller.run().unwrap_err();
    assert!(matches!(err, ScriptError::InvalidMode(_)));
    assert!(err
        .to_string()
        .contains("without an operation name assigned"));
}

#[test]
fn test_missing_script_is_parse_error_with_io_cause() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.eol");
    let mut controller =
        ExecutionController::for_script(ScriptExecutor::new(ScriptEngine::new()), &missing);

    let err = controller.run().unwrap_err();
    assert!(err.is_parse());
    assert!(err.to_string().starts_with("Failed to parse provided script"));
    let cause = err.source().and_then(|c| c.downcast_ref::<EngineError>());
    assert!(matches!(cause, Some(EngineError::Io { .. })));
}

#[test]
fn test_script_file_resolved_against_base() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("main.eol"), "return \"from file\";").unwrap();

    let resolver = BasePathResolver::new(dir.path());
    let mut controller = ExecutionController::builder(ScriptExecutor::new(ScriptEngine::new()))
        .script_relative("main.eol", &resolver)
        .code("return \"inline\";")
        .build();

    assert_eq!(controller.run().unwrap(), Value::from("from file"));
}

#[test]
fn test_parameters_are_read_only_globals() {
    init_logging();
    let mut controller = ExecutionController::builder(ScriptExecutor::new(ScriptEngine::new()))
        .code("return limit * 2;")
        .parameter("limit", 21)
        .build();
    assert_eq!(controller.run().unwrap(), Value::Integer(42));

    let mut controller = ExecutionController::builder(ScriptExecutor::new(ScriptEngine::new()))
        .code("limit = 1;")
        .parameter("limit", 21)
        .build();
    let err = controller.run().unwrap_err();
    assert!(err.is_execution());
    assert!(err.to_string().starts_with("Error executing the module."));
}

#[test]
fn test_models_and_delegates_reach_the_program() {
    init_logging();
    struct Point;
    impl NativeTypeDelegate for Point {
        fn knows_type(&self, type_name: &str) -> bool {
            type_name == "Point"
        }
        fn create_instance(&self, _type_name: &str, arguments: &[Value]) -> Option<Value> {
            Some(Value::List(arguments.to_vec()))
        }
    }

    let model: ModelHandle = Arc::new(InMemoryModel::new(
        "Library",
        vec![serde_json::json!({"title": "a"}), serde_json::json!({"title": "b"})],
    ));
    let mut controller = ExecutionController::builder(ScriptExecutor::new(ScriptEngine::new()))
        .code("return size(contents(Library)) + size(native(\"Point\", 1, 2, 3));")
        .model(model)
        .native_delegate(Arc::new(Point))
        .build();

    assert_eq!(controller.run().unwrap(), Value::Integer(5));
}

#[test]
fn test_validation_report_sections() {
    init_logging();
    let module = MockModule::new().with_unsatisfied(vec![
        UnsatisfiedConstraint::new(
            Constraint::critique("HasDocumentation", "Class"),
            "c1",
            "Person is undocumented",
        ),
        UnsatisfiedConstraint::new(
            Constraint::constraint("NameSet", "Class"),
            "c2",
            "Class has no name",
        ),
    ]);
    let mut controller = ExecutionController::for_code(ValidationExecutor::new(module), "x");

    let unsatisfied = controller.run().unwrap();
    assert_eq!(unsatisfied.len(), 2);

    let mut out = Vec::new();
    print_unsatisfied(&unsatisfied, &mut out).unwrap();
    let report = String::from_utf8(out).unwrap();

    let constraints = report.find("Unsatisfied Constraints").unwrap();
    let critiques = report.find("Unsatisfied Critiques").unwrap();
    assert!(constraints < critiques);
    assert!(report.contains(&format!("{} NameSet          Class has no name", CONSTRAINT_MARKER)));
    assert!(report.contains(&format!(
        "{} HasDocumentation Person is undocumented",
        CRITIQUE_MARKER
    )));
}

#[test]
fn test_redirect_is_not_retroactive() {
    init_logging();
    let (first_stream, first) = Stream::buffer();
    let (second_stream, second) = Stream::buffer();

    let mut controller = ExecutionController::builder(ScriptExecutor::new(ScriptEngine::new()))
        .code("println(\"hello\");")
        .output(first_stream)
        .build();
    controller.run().unwrap();
    assert_eq!(first.contents(), "hello\n");

    let mut controller = controller.with_output(second_stream);
    controller.run().unwrap();

    assert_eq!(first.contents(), "hello\n");
    assert_eq!(second.contents(), "hello\n");
}

#[test]
fn test_warnings_and_errors_have_their_own_streams() {
    init_logging();
    let (warning_stream, warnings) = Stream::buffer();
    let (error_stream, errors) = Stream::buffer();

    let mut controller =
        ExecutionController::for_code(ScriptExecutor::new(ScriptEngine::new()), "warn(\"w\"); error(\"e\");")
            .with_warning(warning_stream)
            .with_error(error_stream);
    controller.run().unwrap();

    assert_eq!(warnings.lines(), vec!["w"]);
    assert_eq!(errors.lines(), vec!["e"]);
}

#[test]
fn test_dispose_twice_is_harmless() {
    init_logging();
    let model: ModelHandle = Arc::new(InMemoryModel::new("M", Vec::new()));
    let mut controller = ExecutionController::builder(ScriptExecutor::new(ScriptEngine::new()))
        .code("return 1;")
        .model(model.clone())
        .build();
    controller.run().unwrap();

    controller.dispose();
    assert!(controller.models().is_empty());
    controller.dispose();
    assert!(controller.models().is_empty());
    assert!(controller.parameters().is_empty());
    assert!(model.is_disposed());
}

#[test]
fn test_clear_keeps_models_usable() {
    init_logging();
    let model: ModelHandle = Arc::new(InMemoryModel::new(
        "Kept",
        vec![serde_json::json!(1)],
    ));
    let mut controller = ExecutionController::builder(ScriptExecutor::new(ScriptEngine::new()))
        .code("return 1;")
        .model(model.clone())
        .dispose_models(false)
        .build();
    controller.run().unwrap();
    controller.dispose();

    assert!(!model.is_disposed());
    assert_eq!(model.contents().len(), 1);
    assert!(controller
        .executor()
        .module()
        .context()
        .models
        .is_empty());
}

#[test]
fn test_profiled_run_records_every_stage() {
    init_logging();
    let mut controller = ExecutionController::builder(ScriptExecutor::new(ScriptEngine::new()))
        .code("var i = 0; while (i < 100) { i = i + 1; } return i;")
        .profile_execution(true)
        .probe(probe())
        .build();

    assert_eq!(controller.run().unwrap(), Value::Integer(100));
    let data = controller.execution_time_data().unwrap();

    assert_eq!(data.host().logical_processors, 8);
    for stage in Stage::ALL {
        assert!(data.stage_duration(stage.as_str()).is_some(), "{} missing", stage);
    }
    let started = data.started_at().unwrap();
    for stage in Stage::ALL {
        assert!(started <= data.stage_started_at(stage.as_str()).unwrap());
    }
    assert!(data.total_duration().unwrap() >= data.execute_duration().unwrap());
    assert!(data.summary().contains("Total duration"));
}

#[test]
fn test_rule_timings_harvested_from_profiler() {
    init_logging();
    let module = MockModule::new().with_rule_timing("MatchClasses", std::time::Duration::from_millis(3));
    let mut controller = ExecutionController::builder(ComparisonExecutor::new(module))
        .code("x")
        .profile_execution(true)
        .probe(probe())
        .build();
    controller.run().unwrap();

    let data = controller.execution_time_data().unwrap();
    assert_eq!(
        data.rule_duration("MatchClasses"),
        Some(std::time::Duration::from_millis(3))
    );
    assert_eq!(data.rule_overwrites(), 0);
}

#[test]
fn test_post_process_fault_carries_stage() {
    init_logging();
    let module = MockModule::new().failing_at(Stage::PostProcess, "cleanup failed");
    let calls = module.calls();
    let mut controller = ExecutionController::for_code(ComparisonExecutor::new(module), "x");

    let err = controller.run().unwrap_err();
    assert!(matches!(
        err,
        ScriptError::Stage {
            stage: Stage::PostProcess,
            ..
        }
    ));
    assert!(!err.is_execution());
    assert_eq!(calls.events(), vec!["parse", "preProcess", "execute", "postProcess"]);
    assert_eq!(controller.state(), LifecycleState::Failed);
}

#[test]
fn test_generic_adapter_stages_are_unsupported() {
    init_logging();
    let adapter = ModuleAdapter::new(Language::Eol, ScriptEngine::new());
    let mut controller = ExecutionController::for_code(adapter, "return 1;");

    let err = controller.run().unwrap_err();
    assert!(matches!(err, ScriptError::Unsupported(_)));
    assert_eq!(controller.state(), LifecycleState::Failed);
}

#[test]
fn test_second_run_is_rejected() {
    init_logging();
    let mut controller =
        ExecutionController::for_code(ScriptExecutor::new(ScriptEngine::new()), "return 1;");
    controller.run().unwrap();

    let err = controller.run().unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_async_run_hands_back_outcome() {
    init_logging();
    let handle = ExecutionController::for_code(
        ScriptExecutor::new(ScriptEngine::new()),
        "return 6 * 7;",
    )
    .run_async()
    .spawn()
    .unwrap();

    let outcome = handle.wait().unwrap();
    assert!(outcome.completed());
    assert!(outcome.exception().is_none());
    assert_eq!(outcome.result(), Some(&Value::Integer(42)));

    let mut controller = outcome.into_controller();
    controller.dispose();
    assert_eq!(controller.state(), LifecycleState::Disposed);
}

#[test]
fn test_runs_are_counted() {
    init_logging();
    let before = get_metrics().runs_total.get();
    let parse_failures = get_metrics().parse_failures.get();

    let mut controller =
        ExecutionController::for_code(ScriptExecutor::new(ScriptEngine::new()), "return (;");
    assert!(controller.run().is_err());

    assert!(get_metrics().runs_total.get() > before);
    assert!(get_metrics().parse_failures.get() > parse_failures);
    assert!(get_metrics()
        .export_prometheus()
        .contains("scriptbox_runs_total"));
}
