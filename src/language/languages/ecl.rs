use crate::config::types::Result;
use crate::core::module::ComparisonModule;
use crate::core::trace::MatchTrace;
use crate::language::adapter::ModuleAdapter;
use crate::language::executor::LanguageExecutor;
use crate::language::registry::Language;

/// Executor for the comparison language
pub struct ComparisonExecutor<M> {
    adapter: ModuleAdapter<M>,
}

impl<M: ComparisonModule> ComparisonExecutor<M> {
    pub fn new(module: M) -> Self {
        Self {
            adapter: ModuleAdapter::new(Language::Ecl, module),
        }
    }

    pub fn module(&self) -> &M {
        self.adapter.module()
    }
}

impl<M: ComparisonModule> LanguageExecutor for ComparisonExecutor<M> {
    type Output = MatchTrace;

    delegate_to_adapter!(adapter);

    fn pre_process(&mut self) -> Result<()> {
        Ok(self.adapter.module_mut().pre_process()?)
    }

    fn post_process(&mut self) -> Result<()> {
        Ok(self.adapter.module_mut().post_process()?)
    }

    fn execute(&mut self) -> Result<MatchTrace> {
        Ok(self.adapter.module_mut().execute()?)
    }
}
