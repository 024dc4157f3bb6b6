use std::collections::BTreeMap;

use hb_core::{widget_id_of, BridgeError, MarshalError, Program, Value, WidgetHandle, WidgetId};
use hb_ui::{
    parse_descriptor, Axis, Frame, Point, Size, StackCursor, Tag, UiDescriptor, WidgetKind,
};
use tracing::{debug, warn};

use crate::hal::HalError;
use crate::ids::next_widget_id;
use crate::registry::{CallbackBinding, NameTable};
use crate::state::BridgeState;

/// What `ui` hands back: every named widget of a container tree, or the
/// handle itself when the root is a single widget.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutput {
    Names(BTreeMap<String, WidgetHandle>),
    Leaf(WidgetHandle),
}

impl RenderOutput {
    pub fn to_value(&self) -> Value {
        match self {
            Self::Names(names) => Value::Map(
                names
                    .iter()
                    .map(|(name, handle)| (name.clone(), handle.to_value()))
                    .collect(),
            ),
            Self::Leaf(handle) => handle.to_value(),
        }
    }
}

pub(crate) struct LeafRequest {
    pub(crate) kind: WidgetKind,
    pub(crate) frame: Frame,
    pub(crate) name: Option<String>,
    pub(crate) text: Option<String>,
    pub(crate) image: Option<String>,
    pub(crate) logic: Option<Program>,
    pub(crate) values: Vec<Value>,
}

impl LeafRequest {
    pub(crate) fn new(kind: WidgetKind, frame: Frame) -> Self {
        Self {
            kind,
            frame,
            name: None,
            text: None,
            image: None,
            logic: None,
            values: Vec::new(),
        }
    }

    fn from_descriptor(kind: WidgetKind, node: &UiDescriptor, origin: Point) -> Self {
        let attributes = &node.attributes;
        Self {
            kind,
            frame: Frame::at(origin),
            name: attributes.name.clone(),
            text: attributes.text.clone(),
            image: attributes.image.clone(),
            logic: attributes.logic.clone(),
            values: attributes.list.clone().unwrap_or_default(),
        }
    }
}

fn hal_failure(error: HalError) -> BridgeError {
    BridgeError::Invocation {
        class: "hal".to_string(),
        method: error.operation.to_string(),
        message: error.message,
    }
}

/// Walks descriptors and drives the platform layer. One interpreter per
/// `ui` call: every binding it creates shares its context and name table.
pub(crate) struct UiInterpreter<'a> {
    state: &'a BridgeState,
    context: Value,
    names: NameTable,
}

impl<'a> UiInterpreter<'a> {
    pub(crate) fn new(state: &'a BridgeState, context: Value) -> Self {
        Self {
            state,
            context,
            names: NameTable::default(),
        }
    }

    pub(crate) fn render(&self, descriptor: &Value) -> Result<RenderOutput, BridgeError> {
        let parsed = parse_descriptor(descriptor)
            .map_err(|error| BridgeError::Descriptor(error.to_string()))?;
        for warning in &parsed.warnings {
            warn!(%warning, "descriptor element skipped");
        }

        let root = parsed.descriptor;
        let origin = self.state.layout.root_origin();
        match WidgetKind::from_tag(root.tag) {
            Some(kind) => {
                let handle = self.render_leaf(kind, &root, origin)?;
                Ok(RenderOutput::Leaf(handle))
            }
            None => {
                let size = self.render_container(&root, origin);
                debug!(width = size.width, height = size.height, "ui rendered");
                Ok(RenderOutput::Names(self.names.snapshot()))
            }
        }
    }

    fn render_container(&self, node: &UiDescriptor, origin: Point) -> Size {
        let axis = match node.tag {
            Tag::Horizontal => Axis::Horizontal,
            _ => Axis::Vertical,
        };
        let mut cursor = StackCursor::new(axis, origin, self.state.layout.spacing);
        for child in &node.children {
            let mut child_origin = cursor.next_origin();
            let kind = WidgetKind::from_tag(child.tag);
            if axis == Axis::Vertical && kind.is_some_and(WidgetKind::auto_measured) {
                child_origin.x = self.state.layout.padding;
            }
            let size = match kind {
                Some(kind) => match self.render_leaf(kind, child, child_origin) {
                    Ok(handle) => Size::new(handle.width, handle.height),
                    Err(error) => {
                        warn!(tag = %child.tag, %error, "widget skipped");
                        continue;
                    }
                },
                None => self.render_container(child, child_origin),
            };
            cursor.advance(size);
        }
        let size = cursor.finish();
        debug!(
            tag = %node.tag,
            name = node.attributes.name.as_deref().unwrap_or_default(),
            width = size.width,
            height = size.height,
            "container laid out"
        );
        size
    }

    fn render_leaf(
        &self,
        kind: WidgetKind,
        node: &UiDescriptor,
        origin: Point,
    ) -> Result<WidgetHandle, BridgeError> {
        let handle = self.create(LeafRequest::from_descriptor(kind, node, origin))?;
        self.place(
            handle.id,
            Frame::new(origin, Size::new(handle.width, handle.height)),
        )?;
        Ok(handle)
    }

    /// Creates a widget. Its logic is bound before it is placed, so it is
    /// never interactive without its binding.
    pub(crate) fn create(&self, request: LeafRequest) -> Result<WidgetHandle, BridgeError> {
        let id = next_widget_id();
        let frame = request.frame;
        let measured = {
            let mut hal = self.state.hal.borrow_mut();
            match request.kind {
                WidgetKind::Button => hal.button(
                    id,
                    frame,
                    request.text.as_deref(),
                    request.image.as_deref(),
                ),
                WidgetKind::Label => {
                    hal.label(id, frame.origin(), request.text.as_deref().unwrap_or_default())
                }
                WidgetKind::Input => hal.input(id, frame.origin()),
                WidgetKind::Table => hal.table(id, frame, &request.values),
            }
        };
        let size = measured.map_err(hal_failure)?;

        self.state
            .widgets
            .borrow_mut()
            .create(
                id,
                request.kind,
                Frame::new(frame.origin(), size),
                request.name.clone(),
            )
            .map_err(|error| BridgeError::Eval(error.to_string()))?;

        if let Some(logic) = request.logic {
            self.state.register_binding(CallbackBinding {
                widget_id: id,
                ui_context: self.context.clone(),
                logic,
                names: self.names.clone(),
            });
        }

        let handle = WidgetHandle {
            id,
            width: size.width,
            height: size.height,
        };
        if let Some(name) = &request.name {
            self.names.insert(name, handle);
        }
        debug!(
            %id,
            kind = request.kind.name(),
            width = size.width,
            height = size.height,
            "widget created"
        );
        Ok(handle)
    }

    pub(crate) fn place(&self, id: WidgetId, frame: Frame) -> Result<(), BridgeError> {
        place_widget(self.state, id, frame)
    }
}

fn place_widget(state: &BridgeState, id: WidgetId, frame: Frame) -> Result<(), BridgeError> {
    let live = state
        .widgets
        .borrow()
        .get(id)
        .map(|record| record.state.is_live());
    match live {
        None => return Err(BridgeError::UnknownWidget { id }),
        Some(false) => {
            return Err(BridgeError::Eval(format!("widget {} was destroyed", id)));
        }
        Some(true) => {}
    }
    state
        .hal
        .borrow_mut()
        .place(id, frame)
        .map_err(hal_failure)?;
    state.widgets.borrow_mut().place(id, frame)
}

fn resolve_target(state: &BridgeState, target: &Value) -> Option<WidgetId> {
    match target {
        Value::String(name) => state
            .widgets
            .borrow()
            .find_by_name(name)
            .map(|(id, _)| id),
        other => widget_id_of(other),
    }
}

/// Replaces a widget's displayed text. Unknown, destroyed or immutable
/// widgets are logged and left alone.
pub(crate) fn ui_set(state: &BridgeState, target: &Value, value: &Value) {
    let Some(id) = resolve_target(state, target) else {
        warn!(target = %target.to_text(), "ui_set target is not a widget");
        return;
    };
    let record = state
        .widgets
        .borrow()
        .get(id)
        .map(|record| (record.kind, record.state));
    match record {
        None => warn!(%id, "ui_set on unknown widget"),
        Some((_, widget_state)) if !widget_state.is_live() => {
            warn!(%id, "ui_set on destroyed widget")
        }
        Some((kind, _)) if !kind.supports_text() => {
            warn!(%id, kind = kind.name(), "ui_set on widget without text")
        }
        Some(_) => {
            let result = state.hal.borrow_mut().set_text(id, &value.to_text());
            if let Err(error) = result {
                warn!(%id, %error, "ui_set refused by platform");
            }
        }
    }
}

/// Moves and resizes an existing widget.
pub(crate) fn ui_put(state: &BridgeState, target: &Value, frame: Frame) -> Result<(), BridgeError> {
    let id = resolve_target(state, target).ok_or(MarshalError::KindMismatch {
        expected: "widget",
        found: target.type_name(),
    })?;
    place_widget(state, id, frame)
}
