use crate::config::types::{EngineResult, Result, ScriptError};
use crate::core::context::NativeTypeDelegate;
use crate::core::model::ModelHandle;
use crate::core::module::{Module, ParseProblem};
use crate::core::profiler::RuleProfiler;
use crate::core::stream::Stream;
use crate::core::value::{Parameters, Value};
use crate::language::executor::LanguageExecutor;
use crate::language::registry::Language;
use std::path::Path;
use std::sync::Arc;

/// Generic executor over any [`Module`].
///
/// Implements everything except the three stage operations, which fail with
/// `ScriptError::Unsupported`. Language executors wrap an adapter and supply
/// their own stages.
pub struct ModuleAdapter<M> {
    language: Language,
    module: M,
}

impl<M: Module> ModuleAdapter<M> {
    pub fn new(language: Language, module: M) -> Self {
        Self { language, module }
    }

    pub fn module(&self) -> &M {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut M {
        &mut self.module
    }

    pub fn into_module(self) -> M {
        self.module
    }

    fn unsupported(&self, operation: &str) -> ScriptError {
        ScriptError::Unsupported(format!(
            "{} is not implemented by the generic {} module adapter",
            operation, self.language
        ))
    }
}

impl<M: Module> LanguageExecutor for ModuleAdapter<M> {
    type Output = Value;

    fn language(&self) -> Language {
        self.language
    }

    fn parse_file(&mut self, path: &Path) -> EngineResult<bool> {
        self.module.parse_file(path)
    }

    fn parse_code(&mut self, code: &str) -> EngineResult<bool> {
        self.module.parse_code(code)
    }

    fn parse_problems(&self) -> &[ParseProblem] {
        self.module.parse_problems()
    }

    fn add_models(&mut self, models: &[ModelHandle]) {
        self.module.context_mut().add_models(models);
    }

    fn add_parameters(&mut self, parameters: &Parameters) {
        let variables = parameters
            .iter()
            .map(|(name, parameter)| parameter.clone().into_variable(name));
        self.module.context_mut().frames.put_globals(variables);
    }

    fn add_native_type_delegates(&mut self, delegates: &[Arc<dyn NativeTypeDelegate>]) {
        self.module.context_mut().add_native_delegates(delegates);
    }

    fn rule_profiler(&self) -> Option<&dyn RuleProfiler> {
        self.module.rule_profiler()
    }

    fn dispose_model_repository(&mut self) {
        self.module.context_mut().models.dispose();
    }

    fn clear_model_repository(&mut self) {
        self.module.context_mut().models.clear();
    }

    fn dispose(&mut self) {
        self.module.context_mut().dispose();
    }

    fn pre_process(&mut self) -> Result<()> {
        Err(self.unsupported("preProcess"))
    }

    fn post_process(&mut self) -> Result<()> {
        Err(self.unsupported("postProcess"))
    }

    fn execute(&mut self) -> Result<Value> {
        Err(self.unsupported("execute"))
    }

    fn redirect_output(&mut self, stream: Stream) {
        self.module.context_mut().set_output(stream);
    }

    fn redirect_warning(&mut self, stream: Stream) {
        self.module.context_mut().set_warning(stream);
    }

    fn redirect_error(&mut self, stream: Stream) {
        self.module.context_mut().set_error(stream);
    }
}

/// Implements the shared [`LanguageExecutor`] operations by forwarding to a
/// `ModuleAdapter` field. The stage operations and `Output` stay with the
/// caller.
macro_rules! delegate_to_adapter {
    ($field:ident) => {
        fn language(&self) -> $crate::language::registry::Language {
            self.$field.language()
        }

        fn parse_file(
            &mut self,
            path: &::std::path::Path,
        ) -> $crate::config::types::EngineResult<bool> {
            self.$field.parse_file(path)
        }

        fn parse_code(&mut self, code: &str) -> $crate::config::types::EngineResult<bool> {
            self.$field.parse_code(code)
        }

        fn parse_problems(&self) -> &[$crate::core::module::ParseProblem] {
            self.$field.parse_problems()
        }

        fn add_models(&mut self, models: &[$crate::core::model::ModelHandle]) {
            self.$field.add_models(models)
        }

        fn add_parameters(&mut self, parameters: &$crate::core::value::Parameters) {
            self.$field.add_parameters(parameters)
        }

        fn add_native_type_delegates(
            &mut self,
            delegates: &[::std::sync::Arc<dyn $crate::core::context::NativeTypeDelegate>],
        ) {
            self.$field.add_native_type_delegates(delegates)
        }

        fn rule_profiler(&self) -> Option<&dyn $crate::core::profiler::RuleProfiler> {
            self.$field.rule_profiler()
        }

        fn dispose_model_repository(&mut self) {
            self.$field.dispose_model_repository()
        }

        fn clear_model_repository(&mut self) {
            self.$field.clear_model_repository()
        }

        fn dispose(&mut self) {
            self.$field.dispose()
        }

        fn redirect_output(&mut self, stream: $crate::core::stream::Stream) {
            self.$field.redirect_output(stream)
        }

        fn redirect_warning(&mut self, stream: $crate::core::stream::Stream) {
            self.$field.redirect_warning(stream)
        }

        fn redirect_error(&mut self, stream: $crate::core::stream::Stream) {
            self.$field.redirect_error(stream)
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::ModuleContext;
    use crate::core::model::InMemoryModel;
    use crate::core::value::{Parameter, Variable};

    #[derive(Default)]
    struct BareModule {
        context: ModuleContext,
        problems: Vec<ParseProblem>,
    }

    impl Module for BareModule {
        fn parse_file(&mut self, _path: &Path) -> EngineResult<bool> {
            Ok(true)
        }

        fn parse_code(&mut self, code: &str) -> EngineResult<bool> {
            if code.is_empty() {
                self.problems.push(ParseProblem::error(1, 1, "empty program"));
            }
            Ok(true)
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

    fn adapter() -> ModuleAdapter<BareModule> {
        ModuleAdapter::new(Language::Eol, BareModule::default())
    }

    #[test]
    fn test_stages_are_unsupported() {
        let mut adapter = adapter();
        assert!(matches!(adapter.pre_process(), Err(ScriptError::Unsupported(_))));
        assert!(matches!(adapter.post_process(), Err(ScriptError::Unsupported(_))));
        let err = adapter.execute().unwrap_err();
        assert!(err.to_string().contains("execute is not implemented"));
    }

    #[test]
    fn test_parameters_bound_read_only() {
        let mut adapter = adapter();
        let mut parameters = Parameters::new();
        parameters.insert("limit".to_string(), Parameter::from(10));
        parameters.insert(
            "counter".to_string(),
            Parameter::from(Variable::mutable("counter", Value::Integer(0))),
        );
        adapter.add_parameters(&parameters);

        let frames = &adapter.module().context().frames;
        let limit = frames.global("limit").unwrap();
        assert!(limit.read_only);
        assert_eq!(limit.value, Value::Integer(10));
        assert!(!frames.global("counter").unwrap().read_only);
    }

    #[test]
    fn test_dispose_versus_clear_repository() {
        let model: ModelHandle = Arc::new(InMemoryModel::new("M", Vec::new()));

        let mut disposing = adapter();
        disposing.add_models(&[Arc::clone(&model)]);
        disposing.clear_model_repository();
        assert!(!model.is_disposed());
        assert!(disposing.module().context().models.is_empty());

        disposing.add_models(&[Arc::clone(&model)]);
        disposing.dispose_model_repository();
        assert!(model.is_disposed());
    }

    #[test]
    fn test_parse_problems_forwarded() {
        let mut adapter = adapter();
        assert!(adapter.parse_code("").unwrap());
        assert_eq!(adapter.parse_problems().len(), 1);
    }

    #[test]
    fn test_redirect_rebinds_context_stream() {
        let (stream, _captured) = Stream::buffer();
        let mut adapter = adapter();
        adapter.redirect_output(stream.clone());
        assert!(adapter.module().context().output().same_sink(&stream));
    }
}
