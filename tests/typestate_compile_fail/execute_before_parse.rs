/// This test should FAIL to compile
/// Attempting to execute before the source was parsed

use scriptbox::exec::stages::Execution;
use scriptbox::language::languages::etl::TransformationExecutor;
use scriptbox::testing::MockModule;

fn main() {
    let mut executor = TransformationExecutor::new(MockModule::new());
    let execution = Execution::new(&mut executor, None);

    // This should fail: Constructed doesn't have an execute method
    execution.execute();
}
