use crate::config::types::Result;
use crate::core::module::MergingModule;
use crate::core::trace::MergeTraces;
use crate::language::adapter::ModuleAdapter;
use crate::language::executor::LanguageExecutor;
use crate::language::registry::Language;

/// Executor for the merging language. The result pairs the comparison
/// trace with the merge trace of the composed engine.
pub struct MergingExecutor<M> {
    adapter: ModuleAdapter<M>,
}

impl<M: MergingModule> MergingExecutor<M> {
    pub fn new(module: M) -> Self {
        Self {
            adapter: ModuleAdapter::new(Language::Eml, module),
        }
    }

    pub fn module(&self) -> &M {
        self.adapter.module()
    }
}

impl<M: MergingModule> LanguageExecutor for MergingExecutor<M> {
    type Output = MergeTraces;

    delegate_to_adapter!(adapter);

    fn pre_process(&mut self) -> Result<()> {
        Ok(self.adapter.module_mut().pre_process()?)
    }

    fn post_process(&mut self) -> Result<()> {
        Ok(self.adapter.module_mut().post_process()?)
    }

    fn execute(&mut self) -> Result<MergeTraces> {
        let module = self.adapter.module_mut();
        module.execute()?;
        Ok(MergeTraces {
            match_trace: module.match_trace(),
            merge_trace: module.merge_trace(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{ScriptError, Stage};
    use crate::core::trace::{Match, MatchTrace, Merge, MergeTrace};
    use crate::testing::MockModule;

    #[test]
    fn test_execute_pairs_traces() {
        let mut match_trace = MatchTrace::default();
        match_trace.push(Match {
            rule: "Person".to_string(),
            left: "l".to_string(),
            right: "r".to_string(),
            matching: true,
        });
        let mut merge_trace = MergeTrace::default();
        merge_trace.push(Merge {
            rule: "MergePerson".to_string(),
            left: "l".to_string(),
            right: "r".to_string(),
            merged: vec!["m".to_string()],
        });
        let module = MockModule::new()
            .with_match_trace(match_trace.clone())
            .with_merge_trace(merge_trace.clone());
        let mut executor = MergingExecutor::new(module);

        let traces = executor.execute().unwrap();
        assert_eq!(traces.match_trace, match_trace);
        assert_eq!(traces.merge_trace, merge_trace);
    }

    #[test]
    fn test_execute_fault_skips_traces() {
        let mut executor =
            MergingExecutor::new(MockModule::new().failing_at(Stage::Execute, "merge conflict"));
        let err = executor.execute().unwrap_err();
        assert!(matches!(err, ScriptError::Engine(_)));
        assert!(err.to_string().contains("merge conflict"));
    }
}
