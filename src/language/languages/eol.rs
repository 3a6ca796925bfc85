use crate::config::types::{Result, ScriptError};
use crate::core::module::ScriptModule;
use crate::core::value::Value;
use crate::language::adapter::ModuleAdapter;
use crate::language::executor::LanguageExecutor;
use crate::language::registry::Language;

const NO_OPERATION_NAME: &str =
    "Can not invoke executor in OPERATION mode without an operation name assigned.";

/// What an expression-language run executes
#[derive(Clone, Debug, PartialEq)]
pub enum Mode {
    /// The whole program
    Script,
    /// One named operation with positional arguments
    Operation {
        name: Option<String>,
        arguments: Vec<Value>,
    },
}

/// Executor for the general expression language
pub struct ScriptExecutor<M> {
    adapter: ModuleAdapter<M>,
    mode: Mode,
}

impl<M: ScriptModule> ScriptExecutor<M> {
    /// Run the whole program
    pub fn new(module: M) -> Self {
        Self {
            adapter: ModuleAdapter::new(Language::Eol, module),
            mode: Mode::Script,
        }
    }

    /// Invoke one operation. An empty name falls back to script mode.
    pub fn for_operation<S: Into<String>>(module: M, name: S, arguments: Vec<Value>) -> Self {
        let mut executor = Self::new(module);
        executor.change_operation(name, arguments);
        executor
    }

    /// Operation mode with the target assigned later through
    /// [`change_operation`](Self::change_operation)
    pub fn operation_mode(module: M) -> Self {
        Self {
            adapter: ModuleAdapter::new(Language::Eol, module),
            mode: Mode::Operation {
                name: None,
                arguments: Vec::new(),
            },
        }
    }

    pub fn change_operation<S: Into<String>>(&mut self, name: S, arguments: Vec<Value>) {
        let name = name.into();
        self.mode = if name.is_empty() {
            Mode::Script
        } else {
            Mode::Operation {
                name: Some(name),
                arguments,
            }
        };
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn module(&self) -> &M {
        self.adapter.module()
    }

    pub fn module_mut(&mut self) -> &mut M {
        self.adapter.module_mut()
    }
}

impl<M: ScriptModule> LanguageExecutor for ScriptExecutor<M> {
    type Output = Value;

    delegate_to_adapter!(adapter);

    fn pre_process(&mut self) -> Result<()> {
        Ok(())
    }

    fn post_process(&mut self) -> Result<()> {
        Ok(())
    }

    fn execute(&mut self) -> Result<Value> {
        match &self.mode {
            Mode::Script => Ok(self.adapter.module_mut().execute()?),
            Mode::Operation { name: None, .. } => {
                Err(ScriptError::InvalidMode(NO_OPERATION_NAME.to_string()))
            }
            Mode::Operation {
                name: Some(name),
                arguments,
            } => {
                let module = self.adapter.module_mut();
                if !module.has_operation(name) {
                    return Err(ScriptError::InvalidMode(format!(
                        "No operation named {} is declared in the program.",
                        name
                    )));
                }
                Ok(module.invoke_operation(name, arguments)?)
            }
        }
    }
}
