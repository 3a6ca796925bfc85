use crate::config::types::Result;
use crate::core::module::ValidationModule;
use crate::core::trace::{Constraint, ConstraintContext, UnsatisfiedConstraint};
use crate::language::adapter::ModuleAdapter;
use crate::language::executor::LanguageExecutor;
use crate::language::registry::Language;
use crate::report::unsatisfied;
use std::io::{self, Write};

/// Executor for the validation language. The result is the set of
/// unsatisfied constraints left once the engine has run.
pub struct ValidationExecutor<M> {
    adapter: ModuleAdapter<M>,
}

impl<M: ValidationModule> ValidationExecutor<M> {
    pub fn new(module: M) -> Self {
        Self {
            adapter: ModuleAdapter::new(Language::Evl, module),
        }
    }

    pub fn module(&self) -> &M {
        self.adapter.module()
    }

    pub fn constraints(&self) -> Vec<Constraint> {
        self.adapter.module().constraints()
    }

    pub fn constraint_contexts(&self) -> Vec<ConstraintContext> {
        self.adapter.module().constraint_contexts()
    }

    pub fn constraint_context(&self, name: &str) -> Option<ConstraintContext> {
        self.constraint_contexts()
            .into_iter()
            .find(|context| context.name == name)
    }

    pub fn unsatisfied_constraints(&self) -> Vec<UnsatisfiedConstraint> {
        self.adapter.module().unsatisfied_constraints()
    }

    pub fn log_unsatisfied(&self) {
        unsatisfied::log_unsatisfied(&self.unsatisfied_constraints());
    }

    pub fn print_unsatisfied<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        unsatisfied::print_unsatisfied(&self.unsatisfied_constraints(), writer)
    }
}

impl<M: ValidationModule> LanguageExecutor for ValidationExecutor<M> {
    type Output = Vec<UnsatisfiedConstraint>;

    delegate_to_adapter!(adapter);

    fn pre_process(&mut self) -> Result<()> {
        Ok(self.adapter.module_mut().pre_process()?)
    }

    fn post_process(&mut self) -> Result<()> {
        Ok(self.adapter.module_mut().post_process()?)
    }

    fn execute(&mut self) -> Result<Vec<UnsatisfiedConstraint>> {
        let module = self.adapter.module_mut();
        module.execute()?;
        Ok(module.unsatisfied_constraints())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockModule;

    fn executor() -> ValidationExecutor<MockModule> {
        let module = MockModule::new()
            .with_constraint_context(ConstraintContext {
                name: "Class".to_string(),
                type_name: "uml::Class".to_string(),
                constraints: vec![
                    Constraint::constraint("NameNotEmpty", "Class"),
                    Constraint::critique("HasDocumentation", "Class"),
                ],
            })
            .with_unsatisfied(vec![
                UnsatisfiedConstraint::new(
                    Constraint::constraint("NameNotEmpty", "Class"),
                    "c1",
                    "Class has no name",
                ),
                UnsatisfiedConstraint::new(
                    Constraint::critique("HasDocumentation", "Class"),
                    "c2",
                    "Person is undocumented",
                ),
            ]);
        ValidationExecutor::new(module)
    }

    #[test]
    fn test_execute_returns_unsatisfied() {
        let mut executor = executor();
        let result = executor.execute().unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result, executor.unsatisfied_constraints());
    }

    #[test]
    fn test_constraint_introspection() {
        let executor = executor();
        assert_eq!(executor.constraints().len(), 2);
        assert_eq!(executor.constraint_contexts().len(), 1);
        assert_eq!(
            executor.constraint_context("Class").map(|c| c.type_name),
            Some("uml::Class".to_string())
        );
        assert!(executor.constraint_context("Package").is_none());
    }

    #[test]
    fn test_print_unsatisfied_writes_both_sections() {
        let executor = executor();
        let mut out = Vec::new();
        executor.print_unsatisfied(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Unsatisfied Constraints"));
        assert!(text.contains("Unsatisfied Critiques"));
        assert!(text.contains("\u{16D6} NameNotEmpty     Class has no name"));
        assert!(text.contains("\u{16B9} HasDocumentation Person is undocumented"));
    }
}
