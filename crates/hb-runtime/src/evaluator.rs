use std::rc::Rc;

use hb_core::Program;
use rhai::{Dynamic, Engine, EvalAltResult, Scope};
use tracing::{debug, error, warn};

use crate::class::HostValue;
use crate::interpreter::{self, UiInterpreter};
use crate::invoker::{self, script_error, unresolved_host_method};
use crate::marshal::{marshal, unmarshal};
use crate::state::BridgeState;

pub const STATUS_OK: i32 = 0;
/// Program bytes are not valid UTF-8 source.
pub const STATUS_BAD_PROGRAM: i32 = 1;
pub const STATUS_PARSE_ERROR: i32 = 2;
/// The script raised an error nothing caught.
pub const STATUS_RUNTIME_ERROR: i32 = 3;

/// Runs one program in a fresh engine and scope. Host handles adopted for the
/// run are dropped when it ends unless something retained them.
pub(crate) fn evaluate(
    state: &Rc<BridgeState>,
    program: &Program,
    bindings: Vec<(String, HostValue)>,
) -> i32 {
    let source = match program.decode() {
        Ok(source) => source,
        Err(error) => {
            error!(%error, "program is not valid UTF-8");
            return STATUS_BAD_PROGRAM;
        }
    };

    let scope_token = state.handles.borrow_mut().open_scope();
    let status = run(state, &source, bindings);
    let dropped = state.handles.borrow_mut().close_scope(scope_token);
    debug!(status, dropped, "handle scope closed");
    status
}

fn run(state: &Rc<BridgeState>, source: &str, bindings: Vec<(String, HostValue)>) -> i32 {
    let mut scope = Scope::new();
    for (name, value) in bindings {
        match marshal(&state.lower(value)) {
            Ok(value) => {
                scope.push_dynamic(name, value);
            }
            Err(error) => {
                warn!(binding = %name, %error, "binding cannot cross the bridge");
                return STATUS_RUNTIME_ERROR;
            }
        }
    }
    let sys = state.adopt(&state.sys);
    scope.push("sys", sys);
    if let Some((name, callback)) = &state.callback {
        let handle = state.adopt(callback);
        scope.push(name.clone(), handle);
    }

    let engine = build_engine(state);
    let ast = match engine.compile_with_scope(&scope, source) {
        Ok(ast) => ast,
        Err(error) => {
            warn!(%error, "script failed to parse");
            return STATUS_PARSE_ERROR;
        }
    };
    match engine.run_ast_with_scope(&mut scope, &ast) {
        Ok(()) => STATUS_OK,
        Err(error) => {
            match unresolved_host_method(&error) {
                Some(signature) => warn!(
                    code = "BRIDGE_METHOD_NOT_FOUND",
                    signature,
                    "script called a method its host object does not declare"
                ),
                None => warn!(%error, "script raised an uncaught error"),
            }
            STATUS_RUNTIME_ERROR
        }
    }
}

fn build_engine(state: &Rc<BridgeState>) -> Engine {
    let mut engine = Engine::new();
    engine.set_strict_variables(true);

    let print_state = Rc::clone(state);
    engine.on_print(move |line| print_state.print(line));
    engine.on_debug(|line, source, position| {
        debug!(target: "hb_runtime::script", ?source, %position, "{}", line);
    });

    invoker::install(&mut engine, state);

    let ui_state = Rc::clone(state);
    engine.register_fn(
        "ui",
        move |context: Dynamic, descriptor: Dynamic| -> Result<Dynamic, Box<EvalAltResult>> {
            let context = unmarshal(context).map_err(|error| script_error(&error.into()))?;
            let descriptor =
                unmarshal(descriptor).map_err(|error| script_error(&error.into()))?;
            let output = UiInterpreter::new(&ui_state, context)
                .render(&descriptor)
                .map_err(|error| script_error(&error))?;
            marshal(&output.to_value()).map_err(|error| script_error(&error.into()))
        },
    );

    let set_state = Rc::clone(state);
    engine.register_fn(
        "ui_set",
        move |target: Dynamic, value: Dynamic| -> Result<(), Box<EvalAltResult>> {
            let target = unmarshal(target).map_err(|error| script_error(&error.into()))?;
            let value = unmarshal(value).map_err(|error| script_error(&error.into()))?;
            interpreter::ui_set(&set_state, &target, &value);
            Ok(())
        },
    );

    engine
}
