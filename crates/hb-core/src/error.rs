use thiserror::Error;

use crate::value::{ObjectHandle, WidgetId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MarshalError {
    #[error("Unsupported {kind} value cannot cross the bridge.")]
    Unsupported { kind: String },
    #[error("Value nesting exceeds {limit} levels; cyclic values are refused.")]
    TooDeep { limit: usize },
    #[error("Expected {expected} but found {found}.")]
    KindMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("Missing argument at position {index}.")]
    MissingArgument { index: usize },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BridgeError {
    #[error("{0}")]
    Marshal(#[from] MarshalError),
    #[error("No method \"{method}\" taking {arity} argument(s) on {class}.")]
    MethodNotFound {
        class: String,
        method: String,
        arity: usize,
    },
    #[error("Call to {class}.{method} failed: {message}")]
    Invocation {
        class: String,
        method: String,
        message: String,
    },
    #[error("Object handle {} is no longer valid.", .handle.raw())]
    StaleHandle { handle: ObjectHandle },
    #[error("Could not read \"{path}\": {message}")]
    Io { path: String, message: String },
    #[error("Widget {id} is not registered.")]
    UnknownWidget { id: WidgetId },
    #[error("Invalid UI descriptor: {0}")]
    Descriptor(String),
    #[error("Evaluation failed: {0}")]
    Eval(String),
}

impl BridgeError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Marshal(_) => "BRIDGE_MARSHAL",
            Self::MethodNotFound { .. } => "BRIDGE_METHOD_NOT_FOUND",
            Self::Invocation { .. } => "BRIDGE_INVOCATION",
            Self::StaleHandle { .. } => "BRIDGE_STALE_HANDLE",
            Self::Io { .. } => "BRIDGE_IO",
            Self::UnknownWidget { .. } => "BRIDGE_UNKNOWN_WIDGET",
            Self::Descriptor(_) => "BRIDGE_DESCRIPTOR",
            Self::Eval(_) => "BRIDGE_EVAL",
        }
    }

    /// Name of the error as script code sees it in `err.kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Marshal(_) => "MarshalError",
            Self::MethodNotFound { .. } => "MethodNotFoundError",
            Self::Invocation { .. } => "InvocationError",
            Self::StaleHandle { .. } => "StaleHandleError",
            Self::Io { .. } => "IOError",
            Self::UnknownWidget { .. } => "UnknownWidgetError",
            Self::Descriptor(_) => "DescriptorError",
            Self::Eval(_) => "EvalError",
        }
    }
}

/// Failure reported by a host method adapter.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HostError {
    #[error("{0}")]
    Marshal(#[from] MarshalError),
    #[error("{0}")]
    Bridge(#[from] BridgeError),
    #[error("{0}")]
    Failed(String),
}

impl HostError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
