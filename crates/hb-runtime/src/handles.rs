use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use hb_core::ObjectHandle;

use crate::class::MethodTable;

struct HandleEntry {
    object: Rc<dyn Any>,
    class: Rc<MethodTable>,
    scope: usize,
    pins: usize,
    closed: bool,
}

/// Marks one evaluation's worth of handles; closing it drops them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a scope that is never closed keeps its handles alive"]
pub struct ScopeToken {
    depth: usize,
}

/// Host objects currently reachable from script code, keyed by opaque handle.
#[derive(Default)]
pub struct HandleTable {
    depth: usize,
    entries: HashMap<ObjectHandle, HandleEntry>,
}

impl HandleTable {
    pub fn open_scope(&mut self) -> ScopeToken {
        self.depth += 1;
        ScopeToken { depth: self.depth }
    }

    /// Drops every unpinned handle adopted at or inside `token`'s scope.
    /// Pinned ones outlive it until their last pin goes.
    pub fn close_scope(&mut self, token: ScopeToken) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| {
            if entry.scope < token.depth {
                return true;
            }
            entry.closed = true;
            entry.pins > 0
        });
        self.depth = token.depth.saturating_sub(1);
        before - self.entries.len()
    }

    pub fn adopt(&mut self, object: Rc<dyn Any>, class: Rc<MethodTable>) -> ObjectHandle {
        let handle = ObjectHandle::fresh();
        self.entries.insert(
            handle,
            HandleEntry {
                object,
                class,
                scope: self.depth,
                pins: 0,
                closed: false,
            },
        );
        handle
    }

    /// Keeps a handle valid past the end of the scope it was adopted in.
    /// Each retain needs its own [`HandleTable::unpin`].
    pub fn retain(&mut self, handle: ObjectHandle) -> bool {
        match self.entries.get_mut(&handle) {
            Some(entry) => {
                entry.pins += 1;
                true
            }
            None => false,
        }
    }

    pub fn unpin(&mut self, handle: ObjectHandle) {
        let Some(entry) = self.entries.get_mut(&handle) else {
            return;
        };
        entry.pins = entry.pins.saturating_sub(1);
        if entry.pins == 0 && entry.closed {
            self.entries.remove(&handle);
        }
    }

    pub fn release(&mut self, handle: ObjectHandle) -> bool {
        self.entries.remove(&handle).is_some()
    }

    pub fn get(&self, handle: ObjectHandle) -> Option<(Rc<dyn Any>, Rc<MethodTable>)> {
        self.entries
            .get(&handle)
            .map(|entry| (Rc::clone(&entry.object), Rc::clone(&entry.class)))
    }

    pub fn contains(&self, handle: ObjectHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
