use crate::config::types::Result;
use crate::core::module::TransformationModule;
use crate::core::trace::TransformationTrace;
use crate::language::adapter::ModuleAdapter;
use crate::language::executor::LanguageExecutor;
use crate::language::registry::Language;

/// Executor for the transformation language
pub struct TransformationExecutor<M> {
    adapter: ModuleAdapter<M>,
}

impl<M: TransformationModule> TransformationExecutor<M> {
    pub fn new(module: M) -> Self {
        Self {
            adapter: ModuleAdapter::new(Language::Etl, module),
        }
    }

    pub fn module(&self) -> &M {
        self.adapter.module()
    }
}

impl<M: TransformationModule> LanguageExecutor for TransformationExecutor<M> {
    type Output = TransformationTrace;

    delegate_to_adapter!(adapter);

    fn pre_process(&mut self) -> Result<()> {
        Ok(self.adapter.module_mut().pre_process()?)
    }

    fn post_process(&mut self) -> Result<()> {
        Ok(self.adapter.module_mut().post_process()?)
    }

    fn execute(&mut self) -> Result<TransformationTrace> {
        Ok(self.adapter.module_mut().execute()?)
    }
}
