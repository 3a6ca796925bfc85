use crate::config::types::Result;
use crate::core::module::TemplateModule;
use crate::language::adapter::ModuleAdapter;
use crate::language::executor::LanguageExecutor;
use crate::language::registry::Language;

/// Executor for the template language, yielding the generated text
pub struct TemplateExecutor<M> {
    adapter: ModuleAdapter<M>,
}

impl<M: TemplateModule> TemplateExecutor<M> {
    pub fn new(module: M) -> Self {
        Self {
            adapter: ModuleAdapter::new(Language::Egl, module),
        }
    }

    pub fn module(&self) -> &M {
        self.adapter.module()
    }
}

impl<M: TemplateModule> LanguageExecutor for TemplateExecutor<M> {
    type Output = Option<String>;

    delegate_to_adapter!(adapter);

    fn pre_process(&mut self) -> Result<()> {
        Ok(())
    }

    fn post_process(&mut self) -> Result<()> {
        Ok(())
    }

    fn execute(&mut self) -> Result<Option<String>> {
        Ok(self.adapter.module_mut().execute()?)
    }
}
