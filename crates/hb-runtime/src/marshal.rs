use std::collections::BTreeMap;

use hb_core::{MarshalError, ObjectHandle, Value};
use rhai::{Array, Blob, Dynamic, ImmutableString, Map, FLOAT, INT};

/// Deepest list/map nesting accepted in either direction. Self-referencing
/// shared script values hit this limit and are refused.
pub const MAX_NESTING_DEPTH: usize = 64;

pub fn marshal(value: &Value) -> Result<Dynamic, MarshalError> {
    marshal_at(value, 0)
}

pub fn unmarshal(value: Dynamic) -> Result<Value, MarshalError> {
    unmarshal_at(value, 0)
}

fn marshal_at(value: &Value, depth: usize) -> Result<Dynamic, MarshalError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(MarshalError::TooDeep {
            limit: MAX_NESTING_DEPTH,
        });
    }
    match value {
        Value::Nil => Ok(Dynamic::UNIT),
        Value::Bool(value) => Ok(Dynamic::from_bool(*value)),
        Value::Int(value) => Ok(Dynamic::from_int(*value)),
        Value::Float(value) => Ok(Dynamic::from_float(*value as FLOAT)),
        Value::String(value) => Ok(Dynamic::from(value.clone())),
        Value::Bytes(value) => Ok(Dynamic::from_blob(value.clone())),
        Value::List(values) => {
            let mut array = Array::with_capacity(values.len());
            for value in values {
                array.push(marshal_at(value, depth + 1)?);
            }
            Ok(Dynamic::from_array(array))
        }
        Value::Map(values) => {
            let mut map = Map::new();
            for (key, value) in values {
                map.insert(key.as_str().into(), marshal_at(value, depth + 1)?);
            }
            Ok(Dynamic::from_map(map))
        }
        Value::Object(handle) => Ok(Dynamic::from(*handle)),
    }
}

fn unmarshal_at(value: Dynamic, depth: usize) -> Result<Value, MarshalError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(MarshalError::TooDeep {
            limit: MAX_NESTING_DEPTH,
        });
    }
    let value = if value.is_shared() {
        value.flatten()
    } else {
        value
    };

    if value.is_unit() {
        return Ok(Value::Nil);
    }
    if value.is::<bool>() {
        return Ok(Value::Bool(value.cast::<bool>()));
    }
    if value.is::<INT>() {
        return Ok(Value::Int(value.cast::<INT>()));
    }
    if value.is::<FLOAT>() {
        return Ok(Value::Float(value.cast::<FLOAT>()));
    }
    if value.is::<ImmutableString>() {
        return Ok(Value::String(value.cast::<ImmutableString>().to_string()));
    }
    if value.is::<char>() {
        return Ok(Value::String(value.cast::<char>().to_string()));
    }
    if value.is::<Blob>() {
        return Ok(Value::Bytes(value.cast::<Blob>()));
    }
    if value.is::<Array>() {
        let array = value.cast::<Array>();
        let mut out = Vec::with_capacity(array.len());
        for item in array {
            out.push(unmarshal_at(item, depth + 1)?);
        }
        return Ok(Value::List(out));
    }
    if value.is::<Map>() {
        let map = value.cast::<Map>();
        let mut out = BTreeMap::new();
        for (key, value) in map {
            out.insert(key.to_string(), unmarshal_at(value, depth + 1)?);
        }
        return Ok(Value::Map(out));
    }
    if value.is::<ObjectHandle>() {
        return Ok(Value::Object(value.cast::<ObjectHandle>()));
    }

    Err(MarshalError::Unsupported {
        kind: value.type_name().to_string(),
    })
}
