//! Reference script engine.
//!
//! A small expression language implementing [`ScriptModule`], enough to drive
//! the controller end to end: operations, variables, control flow, arithmetic
//! and printing to the redirectable streams.
//!
//! ```text
//! operation greet(name) { return "Hello, " + name; }
//! var total = 0;
//! while (total < 3) { total = total + 1; }
//! println(greet("models"), " ", total);
//! ```

pub mod interpreter;
pub mod lexer;
pub mod parser;

use crate::config::types::{EngineError, EngineResult};
use crate::core::context::ModuleContext;
use crate::core::module::{Module, ParseProblem, ScriptModule};
use crate::core::value::Value;
use interpreter::Interpreter;
use parser::Program;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct ScriptEngine {
    context: ModuleContext,
    program: Option<Program>,
    problems: Vec<ParseProblem>,
    source: Option<PathBuf>,
}

impl ScriptEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// File the current program was read from, if any
    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn operation_names(&self) -> Vec<&str> {
        self.program
            .iter()
            .flat_map(|p| p.operations.iter().map(|op| op.name.as_str()))
            .collect()
    }

    fn program(&self) -> EngineResult<&Program> {
        self.program
            .as_ref()
            .ok_or_else(|| EngineError::Runtime("No program has been parsed".to_string()))
    }
}

impl Module for ScriptEngine {
    fn parse_file(&mut self, path: &Path) -> EngineResult<bool> {
        let code = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = self.parse_code(&code)?;
        self.source = Some(path.to_path_buf());
        Ok(parsed)
    }

    fn parse_code(&mut self, code: &str) -> EngineResult<bool> {
        self.source = None;
        match parser::parse(code) {
            Ok(program) => {
                self.program = Some(program);
                self.problems.clear();
                Ok(true)
            }
            Err(problems) => {
                self.program = None;
                self.problems = problems;
                Ok(false)
            }
        }
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
}

impl ScriptModule for ScriptEngine {
    fn execute(&mut self) -> EngineResult<Value> {
        let program = self
            .program
            .as_ref()
            .ok_or_else(|| EngineError::Runtime("No program has been parsed".to_string()))?;
        Interpreter::new(program, &mut self.context).run_script()
    }

    fn has_operation(&self, name: &str) -> bool {
        self.program()
            .map(|p| p.operation(name).is_some())
            .unwrap_or(false)
    }

    fn invoke_operation(&mut self, name: &str, arguments: &[Value]) -> EngineResult<Value> {
        let program = self
            .program
            .as_ref()
            .ok_or_else(|| EngineError::Runtime("No program has been parsed".to_string()))?;
        Interpreter::new(program, &mut self.context).invoke(name, arguments.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::NativeTypeDelegate;
    use crate::core::model::{InMemoryModel, ModelHandle};
    use crate::core::stream::Stream;
    use crate::core::value::Variable;
    use std::sync::Arc;

    fn engine(code: &str) -> ScriptEngine {
        let mut engine = ScriptEngine::new();
        assert!(engine.parse_code(code).unwrap(), "{:?}", engine.parse_problems());
        engine
    }

    fn run(code: &str) -> EngineResult<Value> {
        engine(code).execute()
    }

    #[test]
    fn test_operation_invocation() {
        let mut engine = engine("operation foo() { return 40+2; }");
        assert!(engine.has_operation("foo"));
        assert_eq!(engine.invoke_operation("foo", &[]).unwrap(), Value::Integer(42));
        assert_eq!(engine.operation_names(), vec!["foo"]);
    }

    #[test]
    fn test_script_without_return_is_null() {
        assert_eq!(run("var x = 1;").unwrap(), Value::Null);
    }

    #[test]
    fn test_arithmetic_and_strings() {
        assert_eq!(run("return (1 + 2) * 3 - 4 % 3;").unwrap(), Value::Integer(8));
        assert_eq!(run("return 7 / 2.0;").unwrap(), Value::Real(3.5));
        assert_eq!(run("return \"n=\" + 3;").unwrap(), Value::from("n=3"));
        assert_eq!(run("return -2 < 1 and not false;").unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_control_flow_and_recursion() {
        let code = "
            operation fact(n) { if (n <= 1) { return 1; } return n * fact(n - 1); }
            var i = 0;
            var acc = 0;
            while (i < 4) { i = i + 1; acc = acc + i; }
            return fact(5) + acc;
        ";
        assert_eq!(run(code).unwrap(), Value::Integer(130));
    }

    #[test]
    fn test_runtime_errors() {
        assert!(run("return 1 / 0;").unwrap_err().to_string().contains("Division by zero"));
        assert!(run("return y;").unwrap_err().to_string().contains("Undefined variable y"));
        assert!(run("missing();").is_err());
        assert!(run("if (1) { }").unwrap_err().to_string().contains("Boolean"));
        assert!(run("operation f(a) { return a; } return f();")
            .unwrap_err()
            .to_string()
            .contains("expects 1 argument"));
        assert!(run("operation f() { return f(); } return f();")
            .unwrap_err()
            .to_string()
            .contains("Call depth exceeded"));
    }

    #[test]
    fn test_parameters_are_read_only() {
        let mut assigning = engine("limit = 3;");
        assigning
            .context_mut()
            .frames
            .put_globals([Variable::read_only("limit", Value::Integer(1))]);
        let err = assigning.execute().unwrap_err();
        assert!(err.to_string().contains("read-only variable limit"));

        let mut reading = engine("return limit * 2;");
        reading
            .context_mut()
            .frames
            .put_globals([Variable::read_only("limit", Value::Integer(21))]);
        assert_eq!(reading.execute().unwrap(), Value::Integer(42));
    }

    #[test]
    fn test_script_locals_do_not_leak() {
        let mut engine = engine("var x = 1;");
        engine.execute().unwrap();
        assert!(engine.context().frames.get("x").is_none());
        assert_eq!(engine.context().frames.depth(), 0);
    }

    #[test]
    fn test_print_goes_to_redirected_streams() {
        let (out, captured_out) = Stream::buffer();
        let (warn, captured_warn) = Stream::buffer();
        let mut engine = engine("print(\"a\", 1); println(\"b\"); warn(\"careful\");");
        engine.context_mut().set_output(out);
        engine.context_mut().set_warning(warn);
        engine.execute().unwrap();
        assert_eq!(captured_out.contents(), "a1b\n");
        assert_eq!(captured_warn.contents(), "careful\n");
    }

    #[test]
    fn test_models_resolve_by_name_and_alias() {
        let model: ModelHandle = Arc::new(InMemoryModel::new(
            "Library",
            vec![serde_json::json!("book")],
        ));
        let mut engine = engine("return size(contents(Library));");
        engine.context_mut().add_models(&[model]);
        assert_eq!(engine.execute().unwrap(), Value::Integer(1));
    }

    #[test]
    fn test_native_delegate() {
        struct Pair;
        impl NativeTypeDelegate for Pair {
            fn knows_type(&self, type_name: &str) -> bool {
                type_name == "Pair"
            }
            fn create_instance(&self, _type_name: &str, arguments: &[Value]) -> Option<Value> {
                (arguments.len() == 2).then(|| Value::List(arguments.to_vec()))
            }
        }

        let mut engine = engine("return size(native(\"Pair\", 1, 2));");
        engine.context_mut().add_native_delegates(&[Arc::new(Pair)]);
        assert_eq!(engine.execute().unwrap(), Value::Integer(2));
    }

    #[test]
    fn test_parse_failure_records_problems() {
        let mut engine = ScriptEngine::new();
        assert!(!engine.parse_code("return 1 +;").unwrap());
        assert_eq!(engine.parse_problems().len(), 1);
        assert!(engine.execute().is_err());
    }

    #[test]
    fn test_parse_missing_file() {
        let mut engine = ScriptEngine::new();
        let err = engine
            .parse_file(Path::new("/definitely/not/here.eol"))
            .unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
    }

    #[test]
    fn test_parse_file_records_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.eol");
        std::fs::write(&path, "return 1;").unwrap();
        let mut engine = ScriptEngine::new();
        assert!(engine.parse_file(&path).unwrap());
        assert_eq!(engine.source_path(), Some(path.as_path()));
    }
}
