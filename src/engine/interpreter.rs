//! Tree-walking evaluator for parsed programs

use crate::config::types::{EngineError, EngineResult};
use crate::core::context::ModuleContext;
use crate::core::value::{Value, Variable};
use crate::engine::parser::{BinaryOp, Expr, Operation, Program, Stmt, UnaryOp};

const MAX_CALL_DEPTH: usize = 256;

enum Flow {
    Next,
    Return(Value),
}

pub struct Interpreter<'a> {
    program: &'a Program,
    context: &'a mut ModuleContext,
    depth: usize,
}

fn runtime<T>(message: String) -> EngineResult<T> {
    Err(EngineError::Runtime(message))
}

impl<'a> Interpreter<'a> {
    pub fn new(program: &'a Program, context: &'a mut ModuleContext) -> Self {
        Self {
            program,
            context,
            depth: 0,
        }
    }

    /// Run the top-level statements in a fresh local frame
    pub fn run_script(&mut self) -> EngineResult<Value> {
        let program = self.program;
        self.context.frames.enter_local();
        let flow = self.block(&program.statements);
        self.context.frames.leave_local();
        match flow? {
            Flow::Return(value) => Ok(value),
            Flow::Next => Ok(Value::Null),
        }
    }

    pub fn invoke(&mut self, name: &str, arguments: Vec<Value>) -> EngineResult<Value> {
        let program = self.program;
        match program.operation(name) {
            Some(operation) => self.call_operation(operation, arguments),
            None => runtime(format!("Undefined operation {}", name)),
        }
    }

    fn call_operation(&mut self, operation: &Operation, arguments: Vec<Value>) -> EngineResult<Value> {
        if arguments.len() != operation.params.len() {
            return runtime(format!(
                "Operation {} expects {} argument(s) but got {}",
                operation.name,
                operation.params.len(),
                arguments.len()
            ));
        }
        if self.depth >= MAX_CALL_DEPTH {
            return runtime(format!("Call depth exceeded in operation {}", operation.name));
        }

        self.depth += 1;
        self.context.frames.enter_local();
        for (param, value) in operation.params.iter().zip(arguments) {
            self.context
                .frames
                .declare_local(Variable::mutable(param.as_str(), value));
        }
        let flow = self.block(&operation.body);
        self.context.frames.leave_local();
        self.depth -= 1;

        match flow? {
            Flow::Return(value) => Ok(value),
            Flow::Next => Ok(Value::Null),
        }
    }

    fn block(&mut self, statements: &[Stmt]) -> EngineResult<Flow> {
        for statement in statements {
            if let Flow::Return(value) = self.statement(statement)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Next)
    }

    fn statement(&mut self, statement: &Stmt) -> EngineResult<Flow> {
        match statement {
            Stmt::Var(name, init) => {
                let value = match init {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Null,
                };
                self.context
                    .frames
                    .declare_local(Variable::mutable(name.as_str(), value));
            }
            Stmt::Assign(name, expr) => {
                let value = self.eval(expr)?;
                match self.context.frames.get_mut(name) {
                    Some(variable) if variable.read_only => {
                        return runtime(format!("Cannot assign to read-only variable {}", name));
                    }
                    Some(variable) => variable.value = value,
                    None => return runtime(format!("Undefined variable {}", name)),
                }
            }
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Null,
                };
                return Ok(Flow::Return(value));
            }
            Stmt::If(condition, then, otherwise) => {
                let branch = if self.condition(condition)? { then } else { otherwise };
                return self.scoped(branch);
            }
            Stmt::While(condition, body) => {
                while self.condition(condition)? {
                    if let Flow::Return(value) = self.scoped(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
            Stmt::Expr(expr) => {
                self.eval(expr)?;
            }
        }
        Ok(Flow::Next)
    }

    fn scoped(&mut self, statements: &[Stmt]) -> EngineResult<Flow> {
        self.context.frames.enter_local();
        let flow = self.block(statements);
        self.context.frames.leave_local();
        flow
    }

    fn condition(&mut self, expr: &Expr) -> EngineResult<bool> {
        match self.eval(expr)? {
            Value::Boolean(b) => Ok(b),
            other => runtime(format!("Condition must be Boolean, got {}", other.type_name())),
        }
    }

    fn eval(&mut self, expr: &Expr) -> EngineResult<Value> {
        match expr {
            Expr::Integer(i) => Ok(Value::Integer(*i)),
            Expr::Real(r) => Ok(Value::Real(*r)),
            Expr::String(s) => Ok(Value::String(s.clone())),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Ident(name) => self.lookup(name),
            Expr::Unary(op, operand) => {
                let value = self.eval(operand)?;
                unary(*op, value)
            }
            Expr::Binary(BinaryOp::And, lhs, rhs) => {
                Ok(Value::Boolean(self.condition(lhs)? && self.condition(rhs)?))
            }
            Expr::Binary(BinaryOp::Or, lhs, rhs) => {
                Ok(Value::Boolean(self.condition(lhs)? || self.condition(rhs)?))
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                binary(*op, lhs, rhs)
            }
            Expr::Call(name, arguments) => {
                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.eval(argument)?);
                }
                self.call(name, values)
            }
        }
    }

    /// Locals, then globals, then models by name or alias
    fn lookup(&self, name: &str) -> EngineResult<Value> {
        if let Some(variable) = self.context.frames.get(name) {
            return Ok(variable.value.clone());
        }
        if let Some(model) = self.context.models.model(name) {
            return Ok(Value::Model(model.clone()));
        }
        runtime(format!("Undefined variable {}", name))
    }

    fn call(&mut self, name: &str, arguments: Vec<Value>) -> EngineResult<Value> {
        let program = self.program;
        if let Some(operation) = program.operation(name) {
            return self.call_operation(operation, arguments);
        }

        match name {
            "print" => self.emit(Sink::Output, &arguments, false),
            "println" => self.emit(Sink::Output, &arguments, true),
            "warn" => self.emit(Sink::Warning, &arguments, true),
            "error" => self.emit(Sink::Error, &arguments, true),
            "size" => match arguments.as_slice() {
                [Value::List(items)] => Ok(Value::Integer(items.len() as i64)),
                [Value::String(s)] => Ok(Value::Integer(s.chars().count() as i64)),
                [other] => runtime(format!("size() not defined for {}", other.type_name())),
                _ => runtime("size() takes one argument".to_string()),
            },
            "contents" => match arguments.as_slice() {
                [Value::Model(model)] => Ok(Value::List(model.contents())),
                _ => runtime("contents() takes one model".to_string()),
            },
            "native" => {
                let Some((Value::String(type_name), rest)) = arguments.split_first() else {
                    return runtime("native() takes a type name first".to_string());
                };
                let delegate = match self.context.delegate_for(type_name) {
                    Some(delegate) => delegate,
                    None => return runtime(format!("Unknown native type {}", type_name)),
                };
                delegate.create_instance(type_name, rest).ok_or_else(|| {
                    EngineError::Runtime(format!("Could not create native {}", type_name))
                })
            }
            _ => runtime(format!("Undefined operation {}", name)),
        }
    }

    fn emit(&mut self, sink: Sink, arguments: &[Value], newline: bool) -> EngineResult<Value> {
        let text: String = arguments.iter().map(|v| v.to_string()).collect();
        let stream = match sink {
            Sink::Output => self.context.output(),
            Sink::Warning => self.context.warning(),
            Sink::Error => self.context.error(),
        };
        let written = if newline {
            stream.write_line(&text)
        } else {
            stream.write_str(&text)
        };
        written.map_err(|e| EngineError::Runtime(format!("Failed to write output: {}", e)))?;
        Ok(Value::Null)
    }
}

enum Sink {
    Output,
    Warning,
    Error,
}

fn unary(op: UnaryOp, value: Value) -> EngineResult<Value> {
    match (op, value) {
        (UnaryOp::Neg, Value::Integer(i)) => i
            .checked_neg()
            .map(Value::Integer)
            .ok_or_else(|| EngineError::Runtime("Integer overflow".to_string())),
        (UnaryOp::Neg, Value::Real(r)) => Ok(Value::Real(-r)),
        (UnaryOp::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
        (op, other) => runtime(format!(
            "Operator {:?} not defined for {}",
            op,
            other.type_name()
        )),
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> EngineResult<Value> {
    use BinaryOp::*;

    match op {
        Eq => return Ok(Value::Boolean(lhs == rhs)),
        NotEq => return Ok(Value::Boolean(lhs != rhs)),
        Add if matches!(lhs, Value::String(_)) || matches!(rhs, Value::String(_)) => {
            return Ok(Value::String(format!("{}{}", lhs, rhs)));
        }
        _ => {}
    }

    match (lhs, rhs) {
        (Value::Integer(a), Value::Integer(b)) => integer_op(op, a, b),
        (Value::Integer(a), Value::Real(b)) => real_op(op, a as f64, b),
        (Value::Real(a), Value::Integer(b)) => real_op(op, a, b as f64),
        (Value::Real(a), Value::Real(b)) => real_op(op, a, b),
        (Value::String(a), Value::String(b)) => match op {
            Lt => Ok(Value::Boolean(a < b)),
            Le => Ok(Value::Boolean(a <= b)),
            Gt => Ok(Value::Boolean(a > b)),
            Ge => Ok(Value::Boolean(a >= b)),
            _ => runtime(format!("Operator {:?} not defined for String", op)),
        },
        (a, b) => runtime(format!(
            "Operator {:?} not defined for {} and {}",
            op,
            a.type_name(),
            b.type_name()
        )),
    }
}

fn integer_op(op: BinaryOp, a: i64, b: i64) -> EngineResult<Value> {
    use BinaryOp::*;

    let overflow = || EngineError::Runtime("Integer overflow".to_string());
    match op {
        Add => a.checked_add(b).map(Value::Integer).ok_or_else(overflow),
        Sub => a.checked_sub(b).map(Value::Integer).ok_or_else(overflow),
        Mul => a.checked_mul(b).map(Value::Integer).ok_or_else(overflow),
        Div | Rem if b == 0 => runtime("Division by zero".to_string()),
        Div => a.checked_div(b).map(Value::Integer).ok_or_else(overflow),
        Rem => a.checked_rem(b).map(Value::Integer).ok_or_else(overflow),
        Lt => Ok(Value::Boolean(a < b)),
        Le => Ok(Value::Boolean(a <= b)),
        Gt => Ok(Value::Boolean(a > b)),
        Ge => Ok(Value::Boolean(a >= b)),
        Eq | NotEq | And | Or => runtime(format!("Operator {:?} not numeric", op)),
    }
}

fn real_op(op: BinaryOp, a: f64, b: f64) -> EngineResult<Value> {
    use BinaryOp::*;

    match op {
        Add => Ok(Value::Real(a + b)),
        Sub => Ok(Value::Real(a - b)),
        Mul => Ok(Value::Real(a * b)),
        Div => Ok(Value::Real(a / b)),
        Rem => Ok(Value::Real(a % b)),
        Lt => Ok(Value::Boolean(a < b)),
        Le => Ok(Value::Boolean(a <= b)),
        Gt => Ok(Value::Boolean(a > b)),
        Ge => Ok(Value::Boolean(a >= b)),
        Eq | NotEq | And | Or => runtime(format!("Operator {:?} not numeric", op)),
    }
}
