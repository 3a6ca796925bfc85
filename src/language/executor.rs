use crate::config::types::{EngineResult, Result};
use crate::core::context::NativeTypeDelegate;
use crate::core::model::ModelHandle;
use crate::core::module::ParseProblem;
use crate::core::profiler::RuleProfiler;
use crate::core::stream::Stream;
use crate::core::value::Parameters;
use crate::language::registry::Language;
use std::path::Path;
use std::sync::Arc;

/// Lifecycle contract over one language engine.
///
/// Stage methods report engine faults as `ScriptError::Engine`; the
/// controller attaches stage context. `Output` is the language's result.
pub trait LanguageExecutor: Send {
    type Output: Send + 'static;

    fn language(&self) -> Language;

    fn parse_file(&mut self, path: &Path) -> EngineResult<bool>;

    fn parse_code(&mut self, code: &str) -> EngineResult<bool>;

    fn parse_problems(&self) -> &[ParseProblem];

    fn add_models(&mut self, models: &[ModelHandle]);

    /// Bind each parameter as a read-only global
    fn add_parameters(&mut self, parameters: &Parameters);

    fn add_native_type_delegates(&mut self, delegates: &[Arc<dyn NativeTypeDelegate>]);

    fn rule_profiler(&self) -> Option<&dyn RuleProfiler>;

    /// Dispose every registered model; they are unusable afterwards
    fn dispose_model_repository(&mut self);

    /// Detach models without disposing them
    fn clear_model_repository(&mut self);

    fn dispose(&mut self);

    fn pre_process(&mut self) -> Result<()>;

    fn post_process(&mut self) -> Result<()>;

    fn execute(&mut self) -> Result<Self::Output>;

    fn redirect_output(&mut self, stream: Stream);

    fn redirect_warning(&mut self, stream: Stream);

    fn redirect_error(&mut self, stream: Stream);
}
