use std::cell::RefCell;
use std::rc::Rc;

use hb_core::{BridgeError, ParamKind, Program, Value, WidgetId};
use hb_ui::LayoutConfig;

use crate::{BridgeRuntime, ClassBuilder, HalEvent, HostClass, HostRef, RecordingHal, RuntimeOptions};
use crate::{STATUS_BAD_PROGRAM, STATUS_OK, STATUS_PARSE_ERROR, STATUS_RUNTIME_ERROR};

#[derive(Default)]
struct TestCallback {
    x: i64,
    seen: Vec<Value>,
}

impl HostClass for TestCallback {
    const NAME: &'static str = "TestCallback";

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
                this.seen.extend(args.list(0)?.iter().cloned());
                Ok(Value::Nil)
            })
            .returns::<Counter>()
            .method("make_child", &[ParamKind::Int], |_, args| {
                let child = Counter {
                    count: args.int(0)?,
                };
                Ok(HostRef::new(Rc::new(RefCell::new(child))))
            });
    }
}

struct Counter {
    count: i64,
}

impl HostClass for Counter {
    const NAME: &'static str = "Counter";

    fn describe(class: &mut ClassBuilder<Self>) {
        class
            .field("count", |this| Value::Int(this.count))
            .method("bump", &[], |this, _| {
                this.count += 1;
                Ok(Value::Int(this.count))
            });
    }
}

struct Fixture {
    runtime: BridgeRuntime,
    hal: Rc<RefCell<RecordingHal>>,
    callback: Rc<RefCell<TestCallback>>,
}

impl Fixture {
    fn new() -> Self {
        Self::with_hal(RecordingHal::new())
    }

    fn with_hal(hal: RecordingHal) -> Self {
        let hal = Rc::new(RefCell::new(hal));
        let callback = Rc::new(RefCell::new(TestCallback {
            x: 6,
            ..TestCallback::default()
        }));
        let runtime = BridgeRuntime::new(RuntimeOptions {
            callback: Some(("tc".to_string(), HostRef::new(Rc::clone(&callback)))),
            hal: hal.clone(),
            layout: LayoutConfig::default(),
        });
        Self {
            runtime,
            hal,
            callback,
        }
    }

    fn eval(&self, source: &str) -> i32 {
        self.runtime.eval(&Program::from(source))
    }

    fn seen(&self) -> Vec<Value> {
        self.callback.borrow().seen.clone()
    }

    fn events(&self) -> Vec<HalEvent> {
        self.hal.borrow().events().to_vec()
    }

    fn widget(&self, name: &str) -> WidgetId {
        self.runtime
            .find_widget(name)
            .unwrap_or_else(|| panic!("widget {} should exist", name))
            .id
    }
}

const CLICK_UI: &str = r#"
let names = ui(tc, ["vertical",
    ["label", #{name: "lbl", text: "do not"}],
    ["button", #{name: "bttn", text: "click", logic: "ui_set(lbl, \"ouch\")"}],
    ["input", #{name: "field"}],
    ["table", #{name: "rows", list: ["7", "8", "9"]}]]);
tc.callback(names.lbl.width, names.bttn.height);
"#;

#[test]
fn clicking_a_button_runs_its_logic_against_sibling_names() {
    let fixture = Fixture::new();
    assert_eq!(fixture.eval(CLICK_UI), STATUS_OK);
    assert_eq!(fixture.seen(), vec![Value::Int(78), Value::Int(46)]);

    let lbl = fixture.widget("lbl");
    let bttn = fixture.widget("bttn");
    assert!(fixture.runtime.has_binding(bttn));
    assert!(!fixture.runtime.has_binding(lbl));

    assert_eq!(fixture.runtime.dispatch(bttn), Some(STATUS_OK));
    assert_eq!(
        fixture.events().last(),
        Some(&HalEvent::SetText {
            id: lbl.0,
            text: "ouch".to_string(),
        })
    );
}

#[test]
fn vertical_layout_stacks_children_with_spacing() {
    let fixture = Fixture::new();
    assert_eq!(fixture.eval(CLICK_UI), STATUS_OK);

    let frame_of = |name: &str| {
        fixture
            .runtime
            .widget(fixture.widget(name))
            .map(|record| record.frame)
            .expect("record")
    };
    let lbl = frame_of("lbl");
    assert_eq!((lbl.x, lbl.y, lbl.width, lbl.height), (8, 8, 78, 46));
    let bttn = frame_of("bttn");
    assert_eq!((bttn.x, bttn.y, bttn.width, bttn.height), (8, 64, 70, 46));
    let field = frame_of("field");
    assert_eq!((field.x, field.y, field.width), (8, 120, 300));
    let rows = frame_of("rows");
    assert_eq!((rows.x, rows.y, rows.width, rows.height), (8, 176, 300, 72));
}

#[test]
fn table_rows_reach_the_platform_in_order() {
    let fixture = Fixture::new();
    assert_eq!(
        fixture.eval(r#"let t = sys.table(tc, 0, 0, 0, 0, ["7", "8", "9"], ()); tc.callback(t);"#),
        STATUS_OK
    );
    let seen = fixture.seen();
    let Some(Value::List(triple)) = seen.first() else {
        panic!("expected a triple, got {:?}", seen);
    };
    assert_eq!(triple.len(), 3);
    assert!(triple[0].as_int().expect("id") >= crate::FIRST_WIDGET_ID);
    assert!(triple[1].as_int().expect("width") >= 0);
    assert!(triple[2].as_int().expect("height") >= 0);
    assert!(fixture.events().iter().any(|event| matches!(
        event,
        HalEvent::Table { values, .. }
            if values == &vec![Value::from("7"), Value::from("8"), Value::from("9")]
    )));
}

#[test]
fn host_methods_and_fields_are_reachable_from_script() {
    let fixture = Fixture::new();
    let status = fixture.eval(
        r#"
        tc.callback(tc.x, tc.y(1, 2), tc.z([7, 8, 9], #{p: 99}));
        tc.callback(z(tc, [1], #{}));
        "#,
    );
    assert_eq!(status, STATUS_OK);
    assert_eq!(
        fixture.seen(),
        vec![Value::Int(6), Value::Int(99), Value::Int(3), Value::Int(1)]
    );
}

#[test]
fn reflective_invoke_reports_missing_methods_as_catchable_errors() {
    let fixture = Fixture::new();
    let status = fixture.eval(
        r#"
        tc.callback(invoke(tc, "z", [[7, 8, 9], #{p: 99}]));
        try {
            invoke(tc, "nope", [1]);
        } catch (err) {
            tc.callback(err.kind, err.code);
        }
        "#,
    );
    assert_eq!(status, STATUS_OK);
    assert_eq!(
        fixture.seen(),
        vec![
            Value::Int(3),
            Value::from("MethodNotFoundError"),
            Value::from("BRIDGE_METHOD_NOT_FOUND"),
        ]
    );
}

#[test]
fn wrong_arity_dot_calls_raise_catchable_method_not_found() {
    let fixture = Fixture::new();
    let status = fixture.eval(
        r#"
        try {
            tc.z(1);
        } catch (err) {
            tc.callback(err.kind, err.code);
        }
        try {
            tc.y();
        } catch (err) {
            tc.callback(err.kind);
        }
        "#,
    );
    assert_eq!(status, STATUS_OK);
    assert_eq!(
        fixture.seen(),
        vec![
            Value::from("MethodNotFoundError"),
            Value::from("BRIDGE_METHOD_NOT_FOUND"),
            Value::from("MethodNotFoundError"),
        ]
    );
}

#[test]
fn undeclared_names_go_through_invoke() {
    let fixture = Fixture::new();
    let status = fixture.eval(
        r#"
        try {
            invoke(tc, "nope", []);
        } catch (err) {
            tc.callback(err.kind);
        }
        "#,
    );
    assert_eq!(status, STATUS_OK);
    assert_eq!(fixture.seen(), vec![Value::from("MethodNotFoundError")]);
}

#[test]
fn methods_can_hand_out_new_host_objects() {
    let fixture = Fixture::new();
    let status = fixture.eval(
        r#"
        let child = tc.make_child(4);
        child.bump();
        tc.callback(child.bump(), child.count, invoke(child, "bump", []));
        "#,
    );
    assert_eq!(status, STATUS_OK);
    assert_eq!(
        fixture.seen(),
        vec![Value::Int(6), Value::Int(6), Value::Int(7)]
    );
    assert_eq!(fixture.runtime.live_handles(), 0);
}

#[test]
fn handed_out_objects_can_be_retained() {
    let fixture = Fixture::new();
    let status = fixture.eval("let child = tc.make_child(1); retain(child); tc.callback(child);");
    assert_eq!(status, STATUS_OK);
    let Some(Value::Object(handle)) = fixture.seen().first().cloned() else {
        panic!("expected a host object");
    };
    assert_eq!(fixture.runtime.live_handles(), 1);
    assert_eq!(
        fixture.runtime.invoke(handle, "bump", Vec::new()),
        Ok(Value::Int(2))
    );
    assert!(fixture.runtime.release(handle));
    assert_eq!(fixture.runtime.live_handles(), 0);
}

#[test]
fn status_codes_distinguish_failure_stages() {
    let fixture = Fixture::new();
    assert_eq!(fixture.eval("tc.nope();"), STATUS_RUNTIME_ERROR);
    assert_eq!(fixture.eval("tc.z(1);"), STATUS_RUNTIME_ERROR);
    assert_eq!(fixture.eval("let = ;"), STATUS_PARSE_ERROR);
    assert_eq!(
        fixture.runtime.eval(&Program::Bytes(vec![0xff, 0xfe, 0x00])),
        STATUS_BAD_PROGRAM
    );
    assert_eq!(
        fixture.runtime.eval(&Program::Bytes(b"tc.callback(1);".to_vec())),
        STATUS_OK
    );
    assert_eq!(fixture.seen(), vec![Value::Int(1)]);
}

#[test]
fn handles_go_stale_when_their_eval_ends() {
    let fixture = Fixture::new();
    assert_eq!(fixture.eval("tc.callback(tc);"), STATUS_OK);
    let Some(Value::Object(handle)) = fixture.seen().first().cloned() else {
        panic!("expected a host object");
    };
    assert_eq!(
        fixture.runtime.invoke(handle, "callback", Vec::new()),
        Err(BridgeError::StaleHandle { handle })
    );
    assert_eq!(fixture.runtime.live_handles(), 0);
}

#[test]
fn retained_handles_outlive_their_eval() {
    let fixture = Fixture::new();
    assert_eq!(fixture.eval("retain(tc); tc.callback(tc);"), STATUS_OK);
    let Some(Value::Object(handle)) = fixture.seen().first().cloned() else {
        panic!("expected a host object");
    };
    let result = fixture
        .runtime
        .invoke(handle, "z", vec![Value::List(vec![Value::Nil]), Value::Map(Default::default())])
        .expect("retained handle");
    assert_eq!(result, Value::Int(1));
    assert!(fixture.runtime.release(handle));
}

#[test]
fn binding_context_objects_stay_usable_until_the_widget_dies() {
    let fixture = Fixture::new();
    let status = fixture.eval(
        r#"ui(tc, ["button", #{name: "go", text: "go", logic: "ctx.callback(\"again\")"}]);"#,
    );
    assert_eq!(status, STATUS_OK);
    let go = fixture.widget("go");
    assert_eq!(fixture.runtime.live_handles(), 1);

    assert_eq!(fixture.runtime.dispatch(go), Some(STATUS_OK));
    assert_eq!(fixture.seen(), vec![Value::from("again")]);

    fixture.runtime.destroy_widget(go).expect("destroy");
    assert_eq!(fixture.runtime.live_handles(), 0);
    assert_eq!(fixture.runtime.dispatch(go), None);
}

#[test]
fn ui_set_ignores_unknown_destroyed_and_immutable_widgets() {
    let fixture = Fixture::new();
    let status = fixture.eval(
        r#"ui(tc, ["vertical", ["table", #{name: "rows", list: ["1"]}], ["label", #{name: "gone", text: "x"}]]);"#,
    );
    assert_eq!(status, STATUS_OK);

    let gone = fixture.widget("gone");
    fixture.runtime.destroy_widget(gone).expect("destroy");
    let status = fixture.eval(
        r#"
        ui_set(999999999, "nobody");
        ui_set("rows", "x");
        ui_set("gone", "x");
        ui_set(tc, "x");
        sys.ui_set("nothing", "x");
        "#,
    );
    assert_eq!(status, STATUS_OK);
    assert!(!fixture
        .events()
        .iter()
        .any(|event| matches!(event, HalEvent::SetText { .. })));
}

#[test]
fn container_attributes_other_than_name_bind_nothing() {
    let fixture = Fixture::new();
    let status = fixture.eval(
        r#"
        let names = ui(tc, ["vertical", #{name: "box", logic: "tc.callback(1)"},
            ["label", #{name: "lbl", text: "a"}]]);
        tc.callback(names.keys());
        "#,
    );
    assert_eq!(status, STATUS_OK);
    assert_eq!(fixture.seen(), vec![Value::List(vec![Value::from("lbl")])]);
    assert!(fixture.runtime.find_widget("box").is_none());
    let lbl = fixture.widget("lbl");
    assert!(!fixture.runtime.has_binding(lbl));
}

#[test]
fn dispatch_without_a_binding_does_nothing() {
    let fixture = Fixture::new();
    assert_eq!(fixture.runtime.dispatch(WidgetId(-1)), None);
    assert!(fixture.events().is_empty());
}

#[test]
fn event_payloads_reach_the_logic() {
    let fixture = Fixture::new();
    let status = fixture.eval(
        r#"ui(tc, ["input", #{name: "field", logic: "tc.callback(event, ui.field.id == field.id)"}]);"#,
    );
    assert_eq!(status, STATUS_OK);
    let field = fixture.widget("field");
    assert_eq!(
        fixture.runtime.dispatch_event(field, Value::from("typed")),
        Some(STATUS_OK)
    );
    assert_eq!(fixture.runtime.dispatch(field), Some(STATUS_OK));
    assert_eq!(
        fixture.seen(),
        vec![
            Value::from("typed"),
            Value::Bool(true),
            Value::Nil,
            Value::Bool(true),
        ]
    );
}

#[test]
fn sys_read_returns_empty_text_for_missing_assets() {
    let fixture = Fixture::with_hal(RecordingHal::new().with_asset("a.txt", "hello"));
    assert_eq!(
        fixture.eval(r#"tc.callback(sys.read("a.txt"), sys.read("missing.txt"));"#),
        STATUS_OK
    );
    assert_eq!(fixture.seen(), vec![Value::from("hello"), Value::from("")]);
}

#[test]
fn sys_primitives_create_place_and_bind() {
    let fixture = Fixture::new();
    let status = fixture.eval(
        r#"
        let b = sys.button(tc, 10, 20, 0, 0, "tc.callback(\"hit\")", "go", ());
        tc.callback(b[1], b[2], sys.window(1, 1));
        sys.ui_put(b[0], 40, 50, 100, 60);
        ui_set(b, "gone");
        tc.callback(b[0]);
        "#,
    );
    assert_eq!(status, STATUS_OK);
    let seen = fixture.seen();
    assert_eq!(
        seen[..3],
        [
            Value::Int(46),
            Value::Int(46),
            Value::List(vec![Value::Int(600), Value::Int(800)]),
        ]
    );
    let id = WidgetId(seen[3].as_int().expect("id"));
    let record = fixture.runtime.widget(id).expect("record");
    assert_eq!((record.frame.x, record.frame.y, record.frame.width), (40, 50, 100));
    assert_eq!(fixture.runtime.dispatch(id), Some(STATUS_OK));
    assert_eq!(fixture.seen().last(), Some(&Value::from("hit")));
    assert!(fixture.events().contains(&HalEvent::SetText {
        id: id.0,
        text: "gone".to_string(),
    }));
}

#[test]
fn malformed_descriptors_raise_catchable_errors() {
    let fixture = Fixture::new();
    let status = fixture.eval(
        r#"
        try { ui(tc, "vertical"); } catch (err) { tc.callback(err.kind); }
        try { sys.ui_put("nowhere", 0, 0, 0, 0); } catch (err) { tc.callback(err.kind); }
        "#,
    );
    assert_eq!(status, STATUS_OK);
    assert_eq!(
        fixture.seen(),
        vec![Value::from("DescriptorError"), Value::from("MarshalError")]
    );
}

#[test]
fn broken_children_are_skipped_and_siblings_kept() {
    let fixture = Fixture::new();
    let status = fixture.eval(
        r#"ui(tc, ["vertical",
            ["button", #{text: "pic", image: "missing.png"}],
            ["slider"],
            ["label", #{name: "a", text: "a"}],
            ["label", #{name: "b", text: "b"}]]);"#,
    );
    assert_eq!(status, STATUS_OK);
    let a = fixture.runtime.widget(fixture.widget("a")).expect("a");
    let b = fixture.runtime.widget(fixture.widget("b")).expect("b");
    assert_eq!(a.frame.y, 8);
    assert_eq!(b.frame.y, 64);
}

#[test]
fn horizontal_containers_advance_along_x() {
    let fixture = Fixture::new();
    let status = fixture.eval(
        r#"let names = ui(tc, ["horizontal",
            ["label", #{name: "l", text: "ab"}],
            ["vertical", ["label", #{name: "top", text: "c"}], ["label", #{name: "bottom", text: "d"}]],
            ["label", #{name: "r", text: "c"}]]);
        tc.callback(names.keys().len());"#,
    );
    assert_eq!(status, STATUS_OK);
    assert_eq!(fixture.seen(), vec![Value::Int(4)]);
    let frame = |name: &str| {
        fixture
            .runtime
            .widget(fixture.widget(name))
            .expect("record")
            .frame
    };
    assert_eq!((frame("l").x, frame("l").y), (8, 8));
    assert_eq!((frame("top").x, frame("top").y), (64, 8));
    assert_eq!((frame("bottom").x, frame("bottom").y), (64, 64));
    assert_eq!((frame("r").x, frame("r").y), (112, 8));
}

#[test]
fn leaf_roots_return_their_handle() {
    let fixture = Fixture::new();
    let status = fixture.eval(
        r#"let h = ui(tc, ["label", #{text: "solo"}]); tc.callback(h.width, h.height);"#,
    );
    assert_eq!(status, STATUS_OK);
    assert_eq!(fixture.seen(), vec![Value::Int(62), Value::Int(46)]);
}

#[test]
fn logic_may_render_more_ui_while_dispatching() {
    let fixture = Fixture::new();
    let status = fixture.eval(
        r#"ui(tc, ["button", #{name: "more", text: "more",
            logic: "ui(ctx, [\"label\", #{name: \"late\", text: \"x\"}])"}]);"#,
    );
    assert_eq!(status, STATUS_OK);
    assert!(fixture.runtime.find_widget("late").is_none());
    let more = fixture.widget("more");
    assert_eq!(fixture.runtime.dispatch(more), Some(STATUS_OK));
    assert!(fixture.runtime.find_widget("late").is_some());
}

#[test]
fn print_and_sys_log_reach_the_platform() {
    let fixture = Fixture::new();
    assert_eq!(fixture.eval(r#"print("hi"); sys.log("a", 1, [2]);"#), STATUS_OK);
    assert_eq!(
        fixture.events(),
        vec![
            HalEvent::Print {
                text: "hi".to_string()
            },
            HalEvent::Print {
                text: "a 1 [2]".to_string()
            },
        ]
    );
}

#[test]
fn unsupported_values_fail_the_call_not_the_process() {
    let fixture = Fixture::new();
    let status = fixture.eval(
        r#"
        let f = Fn("noop");
        try { tc.callback(f); } catch (err) { tc.callback(err.kind); }
        "#,
    );
    assert_eq!(status, STATUS_OK);
    assert_eq!(fixture.seen(), vec![Value::from("MarshalError")]);
}
