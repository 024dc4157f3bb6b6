mod class;
mod evaluator;
pub mod hal;
mod handles;
mod ids;
mod interpreter;
mod invoker;
mod marshal;
mod registry;
mod state;
mod sys;
mod widgets;

pub use class::{ClassBuilder, ClassRegistry, HostClass, HostRef, HostValue, MethodTable};
pub use evaluator::{
    STATUS_BAD_PROGRAM, STATUS_OK, STATUS_PARSE_ERROR, STATUS_RUNTIME_ERROR,
};
pub use hal::{Hal, HalError, HalEvent, RecordingHal};
pub use handles::{HandleTable, ScopeToken};
pub use ids::{next_widget_id, FIRST_WIDGET_ID};
pub use interpreter::RenderOutput;
pub use marshal::{marshal, unmarshal, MAX_NESTING_DEPTH};
pub use registry::{dispatch, CallbackBinding, CallbackRegistry, Evaluate, NameTable};
pub use state::{BridgeRuntime, RuntimeOptions};
pub use widgets::{WidgetRecord, WidgetTable};

#[cfg(test)]
mod tests;
