/// This test should FAIL to compile
/// Attempting to reuse a state after it has been consumed

use scriptbox::config::types::SourceRef;
use scriptbox::exec::stages::Execution;
use scriptbox::language::languages::etl::TransformationExecutor;
use scriptbox::testing::MockModule;

fn main() {
    let mut executor = TransformationExecutor::new(MockModule::new());
    let execution = Execution::new(&mut executor, None);

    // First transition consumes execution
    let _parsed = execution
        .parse(SourceRef::Code("rule A {}"))
        .expect("parse failed");

    // This should fail: execution was moved and can no longer be used
    execution.parse(SourceRef::Code("rule B {}"));
}
