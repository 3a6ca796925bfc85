//! Dynamically typed values crossing the engine boundary

use crate::core::model::ModelHandle;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A value a script can see: parameters, operation arguments and results.
#[derive(Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(String),
    List(Vec<Value>),
    Model(ModelHandle),
    /// Host object passed through untouched
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Boolean(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Real(_) => "Real",
            Value::String(_) => "String",
            Value::List(_) => "Sequence",
            Value::Model(_) => "Model",
            Value::Opaque(_) => "Native",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow the host object if it has type `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(inner) => inner.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Value::Opaque(Arc::new(value))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::Integer(a), Value::Real(b)) | (Value::Real(b), Value::Integer(a)) => {
                (*a as f64) == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Model(a), Value::Model(b)) => Arc::ptr_eq(a, b),
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => write!(f, "Boolean({b})"),
            Value::Integer(i) => write!(f, "Integer({i})"),
            Value::Real(r) => write!(f, "Real({r})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Model(m) => write!(f, "Model({})", m.name()),
            Value::Opaque(_) => write!(f, "Opaque(..)"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::String(s) => write!(f, "{s}"),
            Value::List(items) => {
                write!(f, "Sequence {{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "}}")
            }
            Value::Model(m) => write!(f, "{}", m.name()),
            Value::Opaque(_) => write!(f, "<native>"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<ModelHandle> for Value {
    fn from(value: ModelHandle) -> Self {
        Value::Model(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Real(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from).collect()),
            serde_json::Value::Object(_) => Value::String(json.to_string()),
        }
    }
}

/// A named binding in a frame. Parameters are always bound read-only.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    pub name: String,
    pub value: Value,
    pub read_only: bool,
}

impl Variable {
    pub fn read_only<S: Into<String>>(name: S, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            read_only: true,
        }
    }

    pub fn mutable<S: Into<String>>(name: S, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            read_only: false,
        }
    }
}

/// A parameter as supplied by the caller: a bare value, or a binding built by hand.
#[derive(Clone, Debug, PartialEq)]
pub enum Parameter {
    Value(Value),
    Variable(Variable),
}

impl Parameter {
    /// Turn into the global binding the engine will see
    pub fn into_variable(self, name: &str) -> Variable {
        match self {
            Parameter::Value(value) => Variable::read_only(name, value),
            Parameter::Variable(variable) => variable,
        }
    }
}

impl From<Variable> for Parameter {
    fn from(variable: Variable) -> Self {
        Parameter::Variable(variable)
    }
}

macro_rules! parameter_from_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Parameter {
                fn from(value: $ty) -> Self {
                    Parameter::Value(Value::from(value))
                }
            }
        )*
    };
}

parameter_from_value!(bool, i32, i64, f64, &str, String, ModelHandle);

impl From<Value> for Parameter {
    fn from(value: Value) -> Self {
        Parameter::Value(value)
    }
}

/// Name to value map handed to the engine as global bindings
pub type Parameters = HashMap<String, Parameter>;
