use crate::config::types::Result;
use crate::core::module::GenerationModule;
use crate::core::value::Value;
use crate::language::adapter::ModuleAdapter;
use crate::language::executor::LanguageExecutor;
use crate::language::registry::Language;

/// Executor for rule-driven generation. Files written by the rules are the
/// real output; the returned value is whatever the engine reports.
pub struct GenerationExecutor<M> {
    adapter: ModuleAdapter<M>,
}

impl<M: GenerationModule> GenerationExecutor<M> {
    pub fn new(module: M) -> Self {
        Self {
            adapter: ModuleAdapter::new(Language::Egx, module),
        }
    }

    pub fn module(&self) -> &M {
        self.adapter.module()
    }
}

impl<M: GenerationModule> LanguageExecutor for GenerationExecutor<M> {
    type Output = Value;

    delegate_to_adapter!(adapter);

    fn pre_process(&mut self) -> Result<()> {
        Ok(self.adapter.module_mut().pre_process()?)
    }

    fn post_process(&mut self) -> Result<()> {
        Ok(self.adapter.module_mut().post_process()?)
    }

    fn execute(&mut self) -> Result<Value> {
        Ok(self.adapter.module_mut().execute()?)
    }
}
