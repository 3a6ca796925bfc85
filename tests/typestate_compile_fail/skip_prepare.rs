/// This test should FAIL to compile
/// Attempting to skip prepareExecution and go directly to preProcess

use scriptbox::config::types::SourceRef;
use scriptbox::exec::stages::Execution;
use scriptbox::language::languages::etl::TransformationExecutor;
use scriptbox::testing::MockModule;

fn main() {
    let mut executor = TransformationExecutor::new(MockModule::new());
    let execution = Execution::new(&mut executor, None)
        .parse(SourceRef::Code("rule A {}"))
        .expect("parse failed");

    // This should fail: only Prepared has pre_process
    execution.pre_process();
}
