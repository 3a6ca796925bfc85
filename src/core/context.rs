//! Engine context: models, variable frames, native delegates and streams

use crate::core::model::{ModelHandle, ModelRepository};
use crate::core::stream::Stream;
use crate::core::value::{Value, Variable};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Lets scripts reference host-side types by name
pub trait NativeTypeDelegate: Send + Sync {
    fn knows_type(&self, type_name: &str) -> bool;

    fn create_instance(&self, type_name: &str, arguments: &[Value]) -> Option<Value>;
}

/// Global scope plus a stack of local frames
#[derive(Debug, Default)]
pub struct FrameStack {
    globals: HashMap<String, Variable>,
    locals: Vec<HashMap<String, Variable>>,
}

impl FrameStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind variables in the global scope, replacing same-named ones
    pub fn put_globals<I: IntoIterator<Item = Variable>>(&mut self, variables: I) {
        for variable in variables {
            self.globals.insert(variable.name.clone(), variable);
        }
    }

    pub fn global(&self, name: &str) -> Option<&Variable> {
        self.globals.get(name)
    }

    pub fn enter_local(&mut self) {
        self.locals.push(HashMap::new());
    }

    pub fn leave_local(&mut self) {
        self.locals.pop();
    }

    pub fn declare_local(&mut self, variable: Variable) {
        match self.locals.last_mut() {
            Some(frame) => {
                frame.insert(variable.name.clone(), variable);
            }
            None => {
                self.globals.insert(variable.name.clone(), variable);
            }
        }
    }

    /// Innermost binding wins
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.locals
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .or_else(|| self.globals.get(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        for frame in self.locals.iter_mut().rev() {
            if let Some(variable) = frame.get_mut(name) {
                return Some(variable);
            }
        }
        self.globals.get_mut(name)
    }

    pub fn depth(&self) -> usize {
        self.locals.len()
    }

    pub fn clear(&mut self) {
        self.globals.clear();
        self.locals.clear();
    }
}

/// State an engine module runs against
pub struct ModuleContext {
    pub models: ModelRepository,
    pub frames: FrameStack,
    native_delegates: Vec<Arc<dyn NativeTypeDelegate>>,
    output: Stream,
    warning: Stream,
    error: Stream,
}

impl ModuleContext {
    pub fn new() -> Self {
        Self {
            models: ModelRepository::new(),
            frames: FrameStack::new(),
            native_delegates: Vec::new(),
            output: Stream::stdout(),
            warning: Stream::stderr(),
            error: Stream::stderr(),
        }
    }

    pub fn add_models(&mut self, models: &[ModelHandle]) {
        self.models.add_models(models);
    }

    pub fn add_native_delegates(&mut self, delegates: &[Arc<dyn NativeTypeDelegate>]) {
        self.native_delegates.extend(delegates.iter().cloned());
    }

    pub fn native_delegates(&self) -> &[Arc<dyn NativeTypeDelegate>] {
        &self.native_delegates
    }

    pub fn delegate_for(&self, type_name: &str) -> Option<&Arc<dyn NativeTypeDelegate>> {
        self.native_delegates
            .iter()
            .find(|delegate| delegate.knows_type(type_name))
    }

    pub fn output(&self) -> &Stream {
        &self.output
    }

    pub fn warning(&self) -> &Stream {
        &self.warning
    }

    pub fn error(&self) -> &Stream {
        &self.error
    }

    pub fn set_output(&mut self, stream: Stream) {
        self.output = stream;
    }

    pub fn set_warning(&mut self, stream: Stream) {
        self.warning = stream;
    }

    pub fn set_error(&mut self, stream: Stream) {
        self.error = stream;
    }

    /// Drop frames and delegate registrations. Streams stay as they are.
    pub fn dispose(&mut self) {
        self.frames.clear();
        self.native_delegates.clear();
    }
}

impl Default for ModuleContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleContext")
            .field("models", &self.models.len())
            .field("frames", &self.frames)
            .field("native_delegates", &self.native_delegates.len())
            .field("output", &self.output)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PointDelegate;

    impl NativeTypeDelegate for PointDelegate {
        fn knows_type(&self, type_name: &str) -> bool {
            type_name == "Point"
        }

        fn create_instance(&self, _type_name: &str, arguments: &[Value]) -> Option<Value> {
            Some(Value::List(arguments.to_vec()))
        }
    }

    #[test]
    fn test_local_shadows_global() {
        let mut frames = FrameStack::new();
        frames.put_globals([Variable::read_only("x", Value::Integer(1))]);
        frames.enter_local();
        frames.declare_local(Variable::mutable("x", Value::Integer(2)));
        assert_eq!(frames.get("x").map(|v| v.value.clone()), Some(Value::Integer(2)));
        frames.leave_local();
        assert_eq!(frames.get("x").map(|v| v.value.clone()), Some(Value::Integer(1)));
    }

    #[test]
    fn test_dispose_keeps_streams() {
        let (stream, _captured) = crate::core::stream::Stream::buffer();
        let mut context = ModuleContext::new();
        context.set_output(stream.clone());
        context.add_native_delegates(&[Arc::new(PointDelegate)]);
        context.frames.put_globals([Variable::read_only("a", Value::Null)]);

        context.dispose();

        assert!(context.native_delegates().is_empty());
        assert!(context.frames.get("a").is_none());
        assert!(context.output().same_sink(&stream));
    }

    #[test]
    fn test_delegate_lookup() {
        let mut context = ModuleContext::new();
        context.add_native_delegates(&[Arc::new(PointDelegate)]);
        let delegate = context.delegate_for("Point").unwrap();
        assert_eq!(
            delegate.create_instance("Point", &[Value::Integer(1)]),
            Some(Value::List(vec![Value::Integer(1)]))
        );
        assert!(context.delegate_for("Line").is_none());
    }
}
