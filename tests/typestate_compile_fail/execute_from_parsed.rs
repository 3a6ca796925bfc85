/// This test should FAIL to compile
/// Attempting to execute straight after parsing

use scriptbox::config::types::SourceRef;
use scriptbox::exec::stages::Execution;
use scriptbox::language::languages::etl::TransformationExecutor;
use scriptbox::testing::MockModule;

fn main() {
    let mut executor = TransformationExecutor::new(MockModule::new());
    let execution = Execution::new(&mut executor, None)
        .parse(SourceRef::Code("rule A {}"))
        .expect("parse failed");

    // This should fail: Parsed doesn't have an execute method
    execution.execute();
}
