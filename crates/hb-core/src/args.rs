use std::collections::BTreeMap;

use crate::error::MarshalError;
use crate::value::{ObjectHandle, Value};

/// Positional arguments handed to a host method adapter, already coerced to
/// the declared parameter kinds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: Vec<Value>,
}

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, index: usize) -> Result<&Value, MarshalError> {
        self.values
            .get(index)
            .ok_or(MarshalError::MissingArgument { index })
    }

    pub fn int(&self, index: usize) -> Result<i64, MarshalError> {
        let value = self.value(index)?;
        value.as_int().ok_or(MarshalError::KindMismatch {
            expected: "integer",
            found: value.type_name(),
        })
    }

    pub fn float(&self, index: usize) -> Result<f64, MarshalError> {
        let value = self.value(index)?;
        value.as_float().ok_or(MarshalError::KindMismatch {
            expected: "float",
            found: value.type_name(),
        })
    }

    pub fn string(&self, index: usize) -> Result<&str, MarshalError> {
        let value = self.value(index)?;
        value.as_str().ok_or(MarshalError::KindMismatch {
            expected: "string",
            found: value.type_name(),
        })
    }

    /// Like [`Args::string`] but nil or a missing trailing argument reads as `None`.
    pub fn opt_string(&self, index: usize) -> Result<Option<&str>, MarshalError> {
        match self.values.get(index) {
            None | Some(Value::Nil) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.as_str())),
            Some(other) => Err(MarshalError::KindMismatch {
                expected: "string",
                found: other.type_name(),
            }),
        }
    }

    pub fn list(&self, index: usize) -> Result<&[Value], MarshalError> {
        let value = self.value(index)?;
        value.as_list().ok_or(MarshalError::KindMismatch {
            expected: "list",
            found: value.type_name(),
        })
    }

    pub fn map(&self, index: usize) -> Result<&BTreeMap<String, Value>, MarshalError> {
        let value = self.value(index)?;
        value.as_map().ok_or(MarshalError::KindMismatch {
            expected: "map",
            found: value.type_name(),
        })
    }

    pub fn object(&self, index: usize) -> Result<ObjectHandle, MarshalError> {
        let value = self.value(index)?;
        value.as_object().ok_or(MarshalError::KindMismatch {
            expected: "object",
            found: value.type_name(),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.values
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}
