use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MarshalError;
use crate::value::Value;

/// Declared kind of a host method parameter. Arguments are coerced to it
/// before the host adapter runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamKind {
    Any,
    Bool,
    Int,
    Float,
    Number,
    String,
    Bytes,
    List,
    Map,
    Object,
}

impl ParamKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Bool => "bool",
            Self::Int => "integer",
            Self::Float => "float",
            Self::Number => "number",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::List => "list",
            Self::Map => "map",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn coerce(value: Value, kind: ParamKind) -> Result<Value, MarshalError> {
    match (kind, value) {
        (ParamKind::Any, value) => Ok(value),
        (ParamKind::Bool, value @ Value::Bool(_)) => Ok(value),
        (ParamKind::Int, value @ Value::Int(_)) => Ok(value),
        (ParamKind::Float, Value::Int(value)) => Ok(Value::Float(value as f64)),
        (ParamKind::Float, value @ Value::Float(_)) => Ok(value),
        (ParamKind::Number, value @ (Value::Int(_) | Value::Float(_))) => Ok(value),
        (ParamKind::String, value @ Value::String(_)) => Ok(value),
        (ParamKind::Bytes, value @ Value::Bytes(_)) => Ok(value),
        (ParamKind::Bytes, Value::String(value)) => Ok(Value::Bytes(value.into_bytes())),
        (ParamKind::List, value @ Value::List(_)) => Ok(value),
        (ParamKind::Map, value @ Value::Map(_)) => Ok(value),
        (ParamKind::Object, value @ Value::Object(_)) => Ok(value),
        (kind, value) => Err(MarshalError::KindMismatch {
            expected: kind.name(),
            found: value.type_name(),
        }),
    }
}
