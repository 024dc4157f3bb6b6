use crate::{ClassBuilder, HostClass, ParamKind, Value};

/// Host object the demos and the command-line tools expose as `tc`.
/// `callback(...)` records its arguments so a run can be inspected afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct EchoHost {
    pub x: i64,
    pub calls: Vec<Vec<Value>>,
}

impl Default for EchoHost {
    fn default() -> Self {
        Self {
            x: 6,
            calls: Vec::new(),
        }
    }
}

impl EchoHost {
    pub fn take_calls(&mut self) -> Vec<Vec<Value>> {
        std::mem::take(&mut self.calls)
    }
}

impl HostClass for EchoHost {
    const NAME: &'static str = "EchoHost";

    fn describe(class: &mut ClassBuilder<Self>) {
        class
            .field("x", |this| Value::Int(this.x))
            .method("y", &[ParamKind::Any, ParamKind::Any], |_, _| {
                Ok(Value::Int(99))
            })
            .method("z", &[ParamKind::List, ParamKind::Map], |_, args| {
                Ok(Value::Int(args.list(0)?.len() as i64))
            })
            .variadic("callback", &[], ParamKind::Any, |this, args| {
                this.calls.push(args.list(0)?.to_vec());
                Ok(Value::Nil)
            });
    }
}
