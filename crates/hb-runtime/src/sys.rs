use std::rc::{Rc, Weak};

use hb_core::{BridgeError, HostError, ParamKind, Program, Value};
use hb_ui::{Frame, Point, Size, WidgetKind};
use tracing::warn;

use crate::class::{ClassBuilder, HostClass};
use crate::interpreter::{self, LeafRequest, UiInterpreter};
use crate::state::BridgeState;

/// The `sys` object every evaluation sees: asset reads, window metrics and
/// the widget primitives.
pub(crate) struct SysObject {
    state: Weak<BridgeState>,
}

impl SysObject {
    pub(crate) fn new(state: Weak<BridgeState>) -> Self {
        Self { state }
    }

    fn state(&self) -> Result<Rc<BridgeState>, HostError> {
        self.state
            .upgrade()
            .ok_or_else(|| HostError::failed("bridge has shut down"))
    }

    fn primitive(
        &self,
        context: &Value,
        mut request: LeafRequest,
        logic: &Value,
    ) -> Result<Value, HostError> {
        request.logic = logic_of(logic)?;
        let origin = request.frame.origin();
        let state = self.state()?;
        let ui = UiInterpreter::new(&state, context.clone());
        let handle = ui.create(request)?;
        ui.place(
            handle.id,
            Frame::new(origin, Size::new(handle.width, handle.height)),
        )?;
        Ok(handle.to_triple())
    }
}

fn logic_of(value: &Value) -> Result<Option<Program>, HostError> {
    match Program::from_logic(value) {
        None => Ok(None),
        Some(Ok(program)) => Ok(Some(program)),
        Some(Err(found)) => Err(HostError::failed(format!(
            "logic must be a string or bytes, found {}",
            found
        ))),
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Nil => None,
        other => Some(other.to_text()),
    }
}

fn frame_of(x: i64, y: i64, width: i64, height: i64) -> Frame {
    Frame::new(Point::new(x, y), Size::new(width, height))
}

impl HostClass for SysObject {
    const NAME: &'static str = "sys";

    fn describe(class: &mut ClassBuilder<Self>) {
        use ParamKind::{Any, Int, List, String as Text};

        class
            .method("read", &[Text], |this, args| {
                let state = this.state()?;
                let path = args.string(0)?;
                let result = state.hal.borrow_mut().read(path);
                match result {
                    Ok(content) => Ok(Value::String(content)),
                    Err(error) => {
                        let error = BridgeError::Io {
                            path: path.to_string(),
                            message: error.to_string(),
                        };
                        warn!(code = error.code(), %error, "asset read failed");
                        Ok(Value::String(String::new()))
                    }
                }
            })
            .method("window", &[Int, Int], |this, args| {
                let state = this.state()?;
                let size = state.hal.borrow_mut().window(args.int(0)?, args.int(1)?);
                Ok(Value::List(vec![
                    Value::Int(size.width),
                    Value::Int(size.height),
                ]))
            })
            .method(
                "button",
                &[Any, Int, Int, Int, Int, Any, Any, Any],
                |this, args| {
                    let mut request = LeafRequest::new(
                        WidgetKind::Button,
                        frame_of(args.int(1)?, args.int(2)?, args.int(3)?, args.int(4)?),
                    );
                    request.text = text_of(args.value(6)?);
                    request.image = args.opt_string(7)?.map(str::to_string);
                    this.primitive(args.value(0)?, request, args.value(5)?)
                },
            )
            .method("label", &[Any, Int, Int, Any], |this, args| {
                let mut request = LeafRequest::new(
                    WidgetKind::Label,
                    Frame::at(Point::new(args.int(1)?, args.int(2)?)),
                );
                request.text = text_of(args.value(3)?);
                this.primitive(args.value(0)?, request, &Value::Nil)
            })
            .method("input", &[Any, Int, Int], |this, args| {
                let request = LeafRequest::new(
                    WidgetKind::Input,
                    Frame::at(Point::new(args.int(1)?, args.int(2)?)),
                );
                this.primitive(args.value(0)?, request, &Value::Nil)
            })
            .method(
                "table",
                &[Any, Int, Int, Int, Int, List, Any],
                |this, args| {
                    let mut request = LeafRequest::new(
                        WidgetKind::Table,
                        frame_of(args.int(1)?, args.int(2)?, args.int(3)?, args.int(4)?),
                    );
                    request.values = args.list(5)?.to_vec();
                    this.primitive(args.value(0)?, request, args.value(6)?)
                },
            )
            .method("ui_set", &[Any, Any], |this, args| {
                let state = this.state()?;
                interpreter::ui_set(&state, args.value(0)?, args.value(1)?);
                Ok(Value::List(Vec::new()))
            })
            .method("ui_put", &[Any, Int, Int, Int, Int], |this, args| {
                let state = this.state()?;
                let frame = frame_of(args.int(1)?, args.int(2)?, args.int(3)?, args.int(4)?);
                interpreter::ui_put(&state, args.value(0)?, frame)?;
                Ok(Value::List(Vec::new()))
            })
            .method("ui", &[Any, Any], |this, args| {
                let state = this.state()?;
                let ui = UiInterpreter::new(&state, args.value(0)?.clone());
                Ok(ui.render(args.value(1)?)?.to_value())
            })
            .variadic("log", &[], Any, |this, args| {
                let state = this.state()?;
                let line = args
                    .list(0)?
                    .iter()
                    .map(Value::to_text)
                    .collect::<Vec<_>>()
                    .join(" ");
                state.print(&line);
                Ok(Value::Nil)
            });
    }
}
