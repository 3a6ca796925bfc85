/// This test should FAIL to compile
/// Attempting to execute the same program twice in one pass

use scriptbox::config::types::SourceRef;
use scriptbox::exec::stages::Execution;
use scriptbox::language::languages::etl::TransformationExecutor;
use scriptbox::testing::MockModule;
use std::collections::HashMap;

fn main() {
    let mut executor = TransformationExecutor::new(MockModule::new());
    let (executed, _trace) = Execution::new(&mut executor, None)
        .parse(SourceRef::Code("rule A {}"))
        .expect("parse failed")
        .prepare(&[], &HashMap::new(), &[])
        .pre_process()
        .expect("preProcess failed")
        .execute()
        .expect("execute failed");

    // This should fail: Executed doesn't have an execute method
    executed.execute();
}
