use std::cell::RefCell;
use std::rc::Rc;

mod echo;

pub use echo::EchoHost;

pub use hb_core::{
    Args, BridgeError, HostError, ObjectHandle, ParamKind, Program, Value, WidgetHandle,
    WidgetId,
};
pub use hb_runtime::{
    BridgeRuntime, ClassBuilder, Hal, HalError, HalEvent, HostClass, HostRef, HostValue,
    RecordingHal, RenderOutput, WidgetRecord, STATUS_BAD_PROGRAM, STATUS_OK, STATUS_PARSE_ERROR,
    STATUS_RUNTIME_ERROR,
};
pub use hb_ui::{Frame, LayoutConfig, Point, Size};

use hb_runtime::RuntimeOptions;
use thiserror::Error;

/// Variable name of the callback object when none is given.
pub const DEFAULT_EXPOSED_NAME: &str = "callback";

const RESERVED_NAMES: [&str; 4] = ["sys", "ctx", "ui", "event"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Callback name \"{0}\" is not a valid script identifier.")]
    InvalidExposedName(String),
    #[error("Callback name \"{0}\" is reserved by the bridge.")]
    ReservedName(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidExposedName(_) => "API_INVALID_EXPOSED_NAME",
            Self::ReservedName(_) => "API_RESERVED_NAME",
        }
    }
}

#[derive(Clone, Default)]
pub struct BridgeOptions {
    /// Host object every evaluation sees, under `exposed_name`.
    pub callback: Option<HostRef>,
    pub exposed_name: Option<String>,
    /// Platform layer; a fresh [`RecordingHal`] when absent.
    pub hal: Option<Rc<RefCell<dyn Hal>>>,
    pub layout: LayoutConfig,
}

/// Embeds the script runtime next to a host object and a platform layer.
pub struct Bridge {
    runtime: BridgeRuntime,
}

impl Bridge {
    pub fn new(options: BridgeOptions) -> Result<Self, ApiError> {
        let callback = match options.callback {
            Some(callback) => {
                let name = options
                    .exposed_name
                    .unwrap_or_else(|| DEFAULT_EXPOSED_NAME.to_string());
                validate_exposed_name(&name)?;
                Some((name, callback))
            }
            None => None,
        };
        let hal = options
            .hal
            .unwrap_or_else(|| Rc::new(RefCell::new(RecordingHal::default())));
        Ok(Self {
            runtime: BridgeRuntime::new(RuntimeOptions {
                callback,
                hal,
                layout: options.layout,
            }),
        })
    }

    pub fn eval(&self, program: impl Into<Program>) -> i32 {
        self.runtime.eval(&program.into())
    }

    /// Evaluates with extra variables in scope. Bind a [`HostRef`] to hand the
    /// script another host object for the length of this evaluation.
    pub fn eval_with(
        &self,
        program: impl Into<Program>,
        bindings: Vec<(String, HostValue)>,
    ) -> i32 {
        self.runtime.eval_with(&program.into(), bindings)
    }

    /// Platform click on widget `id`. `None` when no logic is bound to it.
    pub fn dispatch(&self, id: WidgetId) -> Option<i32> {
        self.runtime.dispatch(id)
    }

    pub fn dispatch_event(&self, id: WidgetId, event: Value) -> Option<i32> {
        self.runtime.dispatch_event(id, event)
    }

    pub fn destroy_widget(&self, id: WidgetId) -> Result<(), BridgeError> {
        self.runtime.destroy_widget(id)
    }

    pub fn find_widget(&self, name: &str) -> Option<WidgetHandle> {
        self.runtime.find_widget(name)
    }

    pub fn widget(&self, id: WidgetId) -> Option<WidgetRecord> {
        self.runtime.widget(id)
    }

    pub fn runtime(&self) -> &BridgeRuntime {
        &self.runtime
    }
}

fn validate_exposed_name(name: &str) -> Result<(), ApiError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_');
    if !valid_start || !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(ApiError::InvalidExposedName(name.to_string()));
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(ApiError::ReservedName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Greeter {
        greeted: Vec<String>,
    }

    impl HostClass for Greeter {
        const NAME: &'static str = "Greeter";

        fn describe(class: &mut ClassBuilder<Self>) {
            class.method("greet", &[ParamKind::String], |this, args| {
                this.greeted.push(args.string(0)?.to_string());
                Ok(Value::Int(this.greeted.len() as i64))
            });
        }
    }

    fn greeter() -> Rc<RefCell<Greeter>> {
        Rc::new(RefCell::new(Greeter {
            greeted: Vec::new(),
        }))
    }

    #[test]
    fn callback_object_uses_the_default_name() {
        let host = greeter();
        let bridge = Bridge::new(BridgeOptions {
            callback: Some(HostRef::new(Rc::clone(&host))),
            ..BridgeOptions::default()
        })
        .expect("bridge");
        assert_eq!(bridge.eval(r#"callback.greet("filagree");"#), STATUS_OK);
        assert_eq!(host.borrow().greeted, vec!["filagree".to_string()]);
    }

    #[test]
    fn exposed_name_must_be_an_unreserved_identifier() {
        let options = |name: &str| BridgeOptions {
            callback: Some(HostRef::new(greeter())),
            exposed_name: Some(name.to_string()),
            ..BridgeOptions::default()
        };
        let error = Bridge::new(options("9lives")).err().expect("invalid");
        assert_eq!(error.code(), "API_INVALID_EXPOSED_NAME");
        let error = Bridge::new(options("sys")).err().expect("reserved");
        assert_eq!(error.code(), "API_RESERVED_NAME");
        assert!(Bridge::new(options("tc")).is_ok());
    }

    #[test]
    fn shared_hal_sees_rendered_widgets_and_clicks() {
        let hal = Rc::new(RefCell::new(RecordingHal::new()));
        let bridge = Bridge::new(BridgeOptions {
            callback: Some(HostRef::new(greeter())),
            exposed_name: Some("tc".to_string()),
            hal: Some(hal.clone()),
            layout: LayoutConfig::default(),
        })
        .expect("bridge");

        let status = bridge.eval(
            r#"ui(tc, ["vertical",
                ["label", #{name: "lbl", text: "do not"}],
                ["button", #{name: "bttn", text: "click", logic: "ui_set(lbl, \"ouch\")"}]]);"#,
        );
        assert_eq!(status, STATUS_OK);
        let lbl = bridge.find_widget("lbl").expect("lbl");
        let bttn = bridge.find_widget("bttn").expect("bttn");
        assert_eq!(bridge.dispatch(bttn.id), Some(STATUS_OK));
        assert_eq!(
            hal.borrow().events().last(),
            Some(&HalEvent::SetText {
                id: lbl.id.0,
                text: "ouch".to_string(),
            })
        );

        bridge.destroy_widget(bttn.id).expect("destroy");
        assert_eq!(bridge.dispatch(bttn.id), None);
    }

    #[test]
    fn eval_with_exposes_extra_bindings() {
        let host = greeter();
        let bridge = Bridge::new(BridgeOptions {
            callback: Some(HostRef::new(Rc::clone(&host))),
            exposed_name: Some("tc".to_string()),
            ..BridgeOptions::default()
        })
        .expect("bridge");
        let status = bridge.eval_with(
            "tc.greet(who);",
            vec![("who".to_string(), Value::from("host").into())],
        );
        assert_eq!(status, STATUS_OK);
        assert_eq!(host.borrow().greeted, vec!["host".to_string()]);
    }

    #[test]
    fn eval_with_binds_extra_host_objects() {
        let other = greeter();
        let bridge = Bridge::new(BridgeOptions::default()).expect("bridge");
        let before = bridge.runtime().live_handles();
        let status = bridge.eval_with(
            r#"guest.greet("second");"#,
            vec![("guest".to_string(), Rc::clone(&other).into())],
        );
        assert_eq!(status, STATUS_OK);
        assert_eq!(other.borrow().greeted, vec!["second".to_string()]);
        assert_eq!(bridge.runtime().live_handles(), before);
    }

    #[test]
    fn echo_host_answers_like_the_demo_callback() {
        let host = Rc::new(RefCell::new(EchoHost::default()));
        let bridge = Bridge::new(BridgeOptions {
            callback: Some(HostRef::new(Rc::clone(&host))),
            exposed_name: Some("tc".to_string()),
            ..BridgeOptions::default()
        })
        .expect("bridge");
        let status = bridge.eval(r#"tc.callback("fg gets", tc.x, tc.z([1, 2, 3], #{}));"#);
        assert_eq!(status, STATUS_OK);
        assert_eq!(
            host.borrow_mut().take_calls(),
            vec![vec![Value::from("fg gets"), Value::Int(6), Value::Int(3)]]
        );
    }

    #[test]
    fn layout_spacing_is_configurable() {
        let bridge = Bridge::new(BridgeOptions {
            layout: LayoutConfig {
                spacing: 0,
                padding: 0,
            },
            ..BridgeOptions::default()
        })
        .expect("bridge");
        let status = bridge.eval(
            r#"ui((), ["vertical", ["label", #{text: "a"}], ["label", #{name: "b", text: "b"}]]);"#,
        );
        assert_eq!(status, STATUS_OK);
        let b = bridge.find_widget("b").expect("b");
        assert_eq!(bridge.widget(b.id).map(|record| record.frame.y), Some(46));
    }
}
