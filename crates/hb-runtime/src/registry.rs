use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use hb_core::{Program, Value, WidgetHandle, WidgetId};

/// Names assigned during one render, shared by every binding it created.
#[derive(Debug, Clone, Default)]
pub struct NameTable(Rc<RefCell<BTreeMap<String, WidgetHandle>>>);

impl NameTable {
    pub fn insert(&self, name: &str, handle: WidgetHandle) {
        self.0.borrow_mut().insert(name.to_string(), handle);
    }

    pub fn get(&self, name: &str) -> Option<WidgetHandle> {
        self.0.borrow().get(name).copied()
    }

    pub fn snapshot(&self) -> BTreeMap<String, WidgetHandle> {
        self.0.borrow().clone()
    }

    pub fn to_value(&self) -> Value {
        Value::Map(
            self.0
                .borrow()
                .iter()
                .map(|(name, handle)| (name.clone(), handle.to_value()))
                .collect(),
        )
    }
}

/// What runs when a widget fires: its logic, the context the script handed
/// to `ui`, and the names of its render siblings.
#[derive(Debug, Clone)]
pub struct CallbackBinding {
    pub widget_id: WidgetId,
    pub ui_context: Value,
    pub logic: Program,
    pub names: NameTable,
}

#[derive(Debug, Default)]
pub struct CallbackRegistry {
    bindings: HashMap<WidgetId, CallbackBinding>,
}

impl CallbackRegistry {
    /// Stores a binding; a previous binding for the same widget is replaced and returned.
    pub fn register(&mut self, binding: CallbackBinding) -> Option<CallbackBinding> {
        self.bindings.insert(binding.widget_id, binding)
    }

    pub fn get(&self, id: WidgetId) -> Option<&CallbackBinding> {
        self.bindings.get(&id)
    }

    pub fn remove(&mut self, id: WidgetId) -> Option<CallbackBinding> {
        self.bindings.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

pub trait Evaluate {
    /// Runs a binding's logic with `event` as payload and returns the eval status.
    fn evaluate(&self, binding: &CallbackBinding, event: Value) -> i32;
}

/// Fires the binding for `id`, if any. The registry is not borrowed while the
/// logic runs, so the logic may itself render widgets and register bindings.
pub fn dispatch<E: Evaluate + ?Sized>(
    registry: &RefCell<CallbackRegistry>,
    id: WidgetId,
    event: Value,
    evaluator: &E,
) -> Option<i32> {
    let binding = registry.borrow().get(id).cloned()?;
    Some(evaluator.evaluate(&binding, event))
}
