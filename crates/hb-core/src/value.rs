use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::Utf8Error;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Opaque token for a host object living in the bridge's handle table.
///
/// Handles are minted from a process-wide counter and never repeat, so a
/// handle that was not handed out by a handle table resolves to nothing.
/// They serialize for diagnostics but cannot be read back in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ObjectHandle(u64);

impl ObjectHandle {
    pub fn fresh() -> Self {
        Self(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<host object>")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetId(pub i64);

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetHandle {
    pub id: WidgetId,
    pub width: i64,
    pub height: i64,
}

impl WidgetHandle {
    pub fn to_value(&self) -> Value {
        Value::Map(BTreeMap::from([
            ("id".to_string(), Value::Int(self.id.0)),
            ("width".to_string(), Value::Int(self.width)),
            ("height".to_string(), Value::Int(self.height)),
        ]))
    }

    /// The `[id, width, height]` triple every widget primitive returns.
    pub fn to_triple(&self) -> Value {
        Value::List(vec![
            Value::Int(self.id.0),
            Value::Int(self.width),
            Value::Int(self.height),
        ])
    }
}

/// Resolves a widget reference as script code passes it around: a bare id,
/// a handle map, or an `[id, width, height]` triple.
pub fn widget_id_of(value: &Value) -> Option<WidgetId> {
    match value {
        Value::Int(id) => Some(WidgetId(*id)),
        Value::Map(entries) => match entries.get("id") {
            Some(Value::Int(id)) => Some(WidgetId(*id)),
            _ => None,
        },
        Value::List(items) => match items.first() {
            Some(Value::Int(id)) => Some(WidgetId(*id)),
            _ => None,
        },
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Bytes(Vec<u8>),
    #[serde(skip_deserializing)]
    Object(ObjectHandle),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Bytes(_) => "bytes",
            Self::Object(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectHandle> {
        match self {
            Self::Object(handle) => Some(*handle),
            _ => None,
        }
    }

    /// Display form used when a value lands in a text widget or a log line.
    pub fn to_text(&self) -> String {
        match self {
            Self::Nil => String::new(),
            Self::Bool(value) => value.to_string(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => {
                if value.fract().abs() < f64::EPSILON && value.abs() < 1e15 {
                    format!("{}", *value as i64)
                } else {
                    value.to_string()
                }
            }
            Self::String(value) => value.clone(),
            Self::Bytes(value) => String::from_utf8_lossy(value).into_owned(),
            Self::List(values) => format!(
                "[{}]",
                values
                    .iter()
                    .map(Value::to_text)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::Map(values) => format!(
                "{{{}}}",
                values
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key, value.to_text()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::Object(handle) => handle.to_string(),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Self::Map(value)
    }
}

impl From<ObjectHandle> for Value {
    fn from(value: ObjectHandle) -> Self {
        Self::Object(value)
    }
}

impl From<WidgetHandle> for Value {
    fn from(value: WidgetHandle) -> Self {
        value.to_value()
    }
}

/// A script program: source text, or the same text shipped as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Program {
    Source(String),
    Bytes(Vec<u8>),
}

impl Program {
    pub fn decode(&self) -> Result<Cow<'_, str>, Utf8Error> {
        match self {
            Self::Source(source) => Ok(Cow::Borrowed(source.as_str())),
            Self::Bytes(bytes) => std::str::from_utf8(bytes).map(Cow::Borrowed),
        }
    }

    /// Reads a `logic` attribute. Nil means "no logic"; empty text counts as nil.
    pub fn from_logic(value: &Value) -> Option<Result<Self, &'static str>> {
        match value {
            Value::Nil => None,
            Value::String(source) if source.trim().is_empty() => None,
            Value::String(source) => Some(Ok(Self::Source(source.clone()))),
            Value::Bytes(bytes) if bytes.is_empty() => None,
            Value::Bytes(bytes) => Some(Ok(Self::Bytes(bytes.clone()))),
            other => Some(Err(other.type_name())),
        }
    }
}

impl From<&str> for Program {
    fn from(value: &str) -> Self {
        Self::Source(value.to_string())
    }
}

impl From<String> for Program {
    fn from(value: String) -> Self {
        Self::Source(value)
    }
}

impl From<Vec<u8>> for Program {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}
