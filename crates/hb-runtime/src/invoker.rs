use std::any::TypeId;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use hb_core::{BridgeError, ObjectHandle, Value};
use rhai::{Array, Dynamic, Engine, EvalAltResult, ImmutableString, Map, Position};

use crate::marshal::{marshal, unmarshal};
use crate::state::BridgeState;

/// Highest argument count reachable through `obj.method(...)`;
/// `invoke(obj, name, [...])` has no such limit.
pub(crate) const MAX_SCRIPT_ARITY: usize = 12;

/// Global functions taking a leading `Dynamic`. A trampoline under one of these
/// names would win resolution over them, so such methods keep only their
/// declared arities.
const GLOBAL_NAMES: [&str; 9] = [
    "ui",
    "ui_set",
    "invoke",
    "retain",
    "to_string",
    "to_debug",
    "print",
    "debug",
    "type_of",
];

/// Turns a bridge failure into a script error value `#{kind, code, message}`
/// that `try`/`catch` can inspect.
pub(crate) fn script_error(error: &BridgeError) -> Box<EvalAltResult> {
    let mut map = Map::new();
    map.insert("kind".into(), Dynamic::from(error.kind().to_string()));
    map.insert("code".into(), Dynamic::from(error.code().to_string()));
    map.insert("message".into(), Dynamic::from(error.to_string()));
    Box::new(EvalAltResult::ErrorRuntime(
        Dynamic::from_map(map),
        Position::NONE,
    ))
}

/// The call signature when `error` is a method call on a host object under a
/// name no class declares. Such calls never reach the bridge, so they surface
/// as the engine's own "function not found" error.
pub(crate) fn unresolved_host_method(error: &EvalAltResult) -> Option<&str> {
    match error {
        EvalAltResult::ErrorFunctionNotFound(signature, _) => {
            let (_, types) = signature.split_once(" (")?;
            types
                .starts_with("HostObject")
                .then_some(signature.as_str())
        }
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => unresolved_host_method(inner),
        _ => None,
    }
}

fn handle_of(value: &Dynamic) -> Result<ObjectHandle, Box<EvalAltResult>> {
    value.clone().try_cast::<ObjectHandle>().ok_or_else(|| {
        script_error(&BridgeError::Eval(format!(
            "expected a host object, found {}",
            value.type_name()
        )))
    })
}

pub(crate) fn invoke_dynamic(
    state: &BridgeState,
    handle: ObjectHandle,
    method: &str,
    args: Vec<Dynamic>,
) -> Result<Dynamic, Box<EvalAltResult>> {
    let values = args
        .into_iter()
        .map(unmarshal)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|error| script_error(&error.into()))?;
    let result = state
        .invoke(handle, method, values)
        .map_err(|error| script_error(&error))?;
    to_script(&result)
}

fn to_script(value: &Value) -> Result<Dynamic, Box<EvalAltResult>> {
    marshal(value).map_err(|error| script_error(&error.into()))
}

/// Registers one native trampoline per (method name, arity) and one getter per
/// field across every class the bridge has seen, plus `invoke`.
///
/// Declared names get a trampoline at every arity up to [`MAX_SCRIPT_ARITY`],
/// so a wrong argument count reaches the method table and raises a catchable
/// `MethodNotFoundError`. Undeclared names have no trampoline at all.
pub(crate) fn install(engine: &mut Engine, state: &Rc<BridgeState>) {
    let mut arities: BTreeMap<String, BTreeSet<usize>> = BTreeMap::new();
    let mut fields = BTreeSet::new();
    for table in state.classes.borrow().tables() {
        for (name, counts) in table.script_arities(MAX_SCRIPT_ARITY) {
            arities.entry(name).or_default().extend(counts);
        }
        fields.extend(table.field_names().map(str::to_string));
    }

    engine.register_type_with_name::<ObjectHandle>("HostObject");
    engine.register_fn("to_string", |handle: &mut ObjectHandle| handle.to_string());
    engine.register_fn("to_debug", |handle: &mut ObjectHandle| handle.to_string());

    for (name, mut counts) in arities {
        if !GLOBAL_NAMES.contains(&name.as_str()) {
            counts.extend(0..=MAX_SCRIPT_ARITY);
        }
        for arity in counts {
            register_method(engine, state, &name, arity);
        }
    }
    for field in fields {
        register_getter(engine, state, &field);
    }

    let invoke_state = Rc::clone(state);
    engine.register_fn(
        "invoke",
        move |handle: ObjectHandle,
              method: ImmutableString,
              args: Array|
              -> Result<Dynamic, Box<EvalAltResult>> {
            invoke_dynamic(&invoke_state, handle, &method, args)
        },
    );

    let retain_state = Rc::clone(state);
    engine.register_fn("retain", move |handle: ObjectHandle| -> bool {
        retain_state.handles.borrow_mut().retain(handle)
    });
}

fn register_method(engine: &mut Engine, state: &Rc<BridgeState>, name: &str, arity: usize) {
    let mut arg_types = Vec::with_capacity(arity + 1);
    arg_types.push(TypeId::of::<ObjectHandle>());
    arg_types.extend(std::iter::repeat(TypeId::of::<Dynamic>()).take(arity));

    let state = Rc::clone(state);
    let method = name.to_string();
    engine.register_raw_fn(name.to_string(), arg_types, move |_context, args| {
        let handle = handle_of(&*args[0])?;
        let rest = args[1..].iter().map(|arg| Dynamic::clone(arg)).collect();
        invoke_dynamic(&state, handle, &method, rest)
    });
}

fn register_getter(engine: &mut Engine, state: &Rc<BridgeState>, field: &str) {
    let state = Rc::clone(state);
    let name = field.to_string();
    engine.register_raw_fn(
        format!("get${}", field),
        [TypeId::of::<ObjectHandle>()],
        move |_context, args| {
            let handle = handle_of(&*args[0])?;
            let value = state
                .read_field(handle, &name)
                .map_err(|error| script_error(&error))?;
            to_script(&value)
        },
    );
}
