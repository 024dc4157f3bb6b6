use std::cell::RefCell;
use std::rc::Rc;

use hb_core::{BridgeError, ObjectHandle, Program, Value, WidgetHandle, WidgetId};
use hb_ui::LayoutConfig;
use tracing::{debug, info};

use crate::class::{ClassRegistry, HostRef, HostValue};
use crate::evaluator;
use crate::hal::{Hal, RecordingHal};
use crate::handles::HandleTable;
use crate::registry::{dispatch, CallbackBinding, CallbackRegistry, Evaluate};
use crate::sys::SysObject;
use crate::widgets::{WidgetRecord, WidgetTable};

pub struct RuntimeOptions {
    /// Host object exposed to every evaluation under the given variable name.
    pub callback: Option<(String, HostRef)>,
    pub hal: Rc<RefCell<dyn Hal>>,
    pub layout: LayoutConfig,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            callback: None,
            hal: Rc::new(RefCell::new(RecordingHal::default())),
            layout: LayoutConfig::default(),
        }
    }
}

pub(crate) struct BridgeState {
    pub(crate) hal: Rc<RefCell<dyn Hal>>,
    pub(crate) layout: LayoutConfig,
    pub(crate) handles: RefCell<HandleTable>,
    pub(crate) classes: RefCell<ClassRegistry>,
    pub(crate) registry: RefCell<CallbackRegistry>,
    pub(crate) widgets: RefCell<WidgetTable>,
    pub(crate) callback: Option<(String, HostRef)>,
    pub(crate) sys: HostRef,
}

impl BridgeState {
    /// Puts a host object in the current handle scope.
    pub(crate) fn adopt(&self, host: &HostRef) -> ObjectHandle {
        let table = host.table(&mut self.classes.borrow_mut());
        self.handles.borrow_mut().adopt(host.object(), table)
    }

    /// Calls a method on a live handle. A host object coming back is adopted
    /// into the innermost open scope, or kept until released when none is open.
    pub(crate) fn invoke(
        &self,
        handle: ObjectHandle,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, BridgeError> {
        let (object, table) = self
            .handles
            .borrow()
            .get(handle)
            .ok_or(BridgeError::StaleHandle { handle })?;
        debug!(class = table.name(), method, arity = args.len(), "invoke");
        let result = table.call(&*object, method, args)?;
        Ok(self.lower(result))
    }

    pub(crate) fn lower(&self, value: HostValue) -> Value {
        match value {
            HostValue::Value(value) => value,
            HostValue::Ref(object) => Value::Object(self.adopt(&object)),
        }
    }

    pub(crate) fn read_field(&self, handle: ObjectHandle, field: &str) -> Result<Value, BridgeError> {
        let (object, table) = self
            .handles
            .borrow()
            .get(handle)
            .ok_or(BridgeError::StaleHandle { handle })?;
        table.read_field(&*object, field)
    }

    pub(crate) fn print(&self, line: &str) {
        self.hal.borrow_mut().print(line);
    }

    /// Pins every host object reachable from `value`, or unpins with `pin == false`.
    pub(crate) fn pin_objects(&self, value: &Value, pin: bool) {
        match value {
            Value::Object(handle) => {
                let mut handles = self.handles.borrow_mut();
                if pin {
                    handles.retain(*handle);
                } else {
                    handles.unpin(*handle);
                }
            }
            Value::List(items) => items.iter().for_each(|item| self.pin_objects(item, pin)),
            Value::Map(entries) => entries
                .values()
                .for_each(|entry| self.pin_objects(entry, pin)),
            _ => {}
        }
    }

    pub(crate) fn register_binding(&self, binding: CallbackBinding) {
        self.pin_objects(&binding.ui_context, true);
        let previous = self.registry.borrow_mut().register(binding);
        if let Some(previous) = previous {
            self.pin_objects(&previous.ui_context, false);
        }
    }

    pub(crate) fn destroy_widget(&self, id: WidgetId) -> Result<(), BridgeError> {
        self.widgets.borrow_mut().destroy(id)?;
        let binding = self.registry.borrow_mut().remove(id);
        if let Some(binding) = binding {
            self.pin_objects(&binding.ui_context, false);
        }
        debug!(%id, "widget destroyed");
        Ok(())
    }
}

/// Binds the dispatch scope: sibling names first, so the fixed names win.
impl Evaluate for Rc<BridgeState> {
    fn evaluate(&self, binding: &CallbackBinding, event: Value) -> i32 {
        let names = binding.names.snapshot();
        let mut bindings = names
            .iter()
            .map(|(name, handle)| (name.clone(), handle.to_value().into()))
            .collect::<Vec<(String, HostValue)>>();
        bindings.push(("ctx".to_string(), binding.ui_context.clone().into()));
        bindings.push(("ui".to_string(), binding.names.to_value().into()));
        bindings.push(("event".to_string(), event.into()));
        debug!(id = %binding.widget_id, "dispatching widget logic");
        evaluator::evaluate(self, &binding.logic, bindings)
    }
}

/// Owns the bridge: the platform layer, handle table, callback registry and
/// widget table. Single-threaded; every call runs to completion on the caller.
pub struct BridgeRuntime {
    state: Rc<BridgeState>,
}

impl BridgeRuntime {
    pub fn new(options: RuntimeOptions) -> Self {
        let state = Rc::new_cyclic(|weak| BridgeState {
            hal: options.hal,
            layout: options.layout,
            handles: RefCell::new(HandleTable::default()),
            classes: RefCell::new(ClassRegistry::default()),
            registry: RefCell::new(CallbackRegistry::default()),
            widgets: RefCell::new(WidgetTable::default()),
            callback: options.callback,
            sys: HostRef::new(Rc::new(RefCell::new(SysObject::new(weak.clone())))),
        });
        Self { state }
    }

    pub fn eval(&self, program: &Program) -> i32 {
        self.eval_with(program, Vec::new())
    }

    /// Evaluates with extra variables in scope next to `sys` and the callback object.
    /// Host objects among them get handles that live as long as the evaluation.
    pub fn eval_with(&self, program: &Program, bindings: Vec<(String, HostValue)>) -> i32 {
        let status = evaluator::evaluate(&self.state, program, bindings);
        info!(status, "eval finished");
        status
    }

    pub fn dispatch(&self, id: WidgetId) -> Option<i32> {
        self.dispatch_event(id, Value::Nil)
    }

    /// Runs the logic bound to `id` with `event` as payload; `None` when
    /// nothing is bound.
    pub fn dispatch_event(&self, id: WidgetId, event: Value) -> Option<i32> {
        let status = dispatch(&self.state.registry, id, event, &self.state);
        if status.is_none() {
            debug!(%id, "no logic bound");
        }
        status
    }

    pub fn destroy_widget(&self, id: WidgetId) -> Result<(), BridgeError> {
        self.state.destroy_widget(id)
    }

    pub fn invoke(
        &self,
        handle: ObjectHandle,
        method: &str,
        args: Vec<Value>,
    ) -> Result<Value, BridgeError> {
        self.state.invoke(handle, method, args)
    }

    pub fn retain(&self, handle: ObjectHandle) -> bool {
        self.state.handles.borrow_mut().retain(handle)
    }

    pub fn release(&self, handle: ObjectHandle) -> bool {
        self.state.handles.borrow_mut().release(handle)
    }

    pub fn live_handles(&self) -> usize {
        self.state.handles.borrow().len()
    }

    pub fn find_widget(&self, name: &str) -> Option<WidgetHandle> {
        let widgets = self.state.widgets.borrow();
        widgets
            .find_by_name(name)
            .map(|(id, record)| record.handle(id))
    }

    pub fn widget(&self, id: WidgetId) -> Option<WidgetRecord> {
        self.state.widgets.borrow().get(id).cloned()
    }

    pub fn has_binding(&self, id: WidgetId) -> bool {
        self.state.registry.borrow().get(id).is_some()
    }

    pub fn layout(&self) -> LayoutConfig {
        self.state.layout
    }
}
