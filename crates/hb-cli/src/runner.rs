use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use hb_api::{
    Bridge, BridgeOptions, EchoHost, HostRef, LayoutConfig, Program, RecordingHal, STATUS_OK,
};
use tracing::{info, warn};

use crate::{map_cli_bridge, map_cli_output_json, map_cli_script_path, map_cli_script_read};
use crate::{CliError, RunArgs};

pub(crate) fn resolve_script(script: &str) -> Result<PathBuf, CliError> {
    let path = PathBuf::from(script);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(map_cli_script_path)?
            .join(path)
    };

    if !absolute.exists() {
        return Err(CliError::new(
            "CLI_SCRIPT_NOT_FOUND",
            format!("script does not exist: {}", absolute.display()),
        ));
    }
    if !absolute.is_file() {
        return Err(CliError::new(
            "CLI_SCRIPT_NOT_FILE",
            format!("script is not a file: {}", absolute.display()),
        ));
    }
    Ok(absolute)
}

fn layout_from(args: &RunArgs) -> LayoutConfig {
    let mut layout = LayoutConfig::default();
    if let Some(spacing) = args.spacing {
        layout.spacing = spacing;
    }
    if let Some(padding) = args.padding {
        layout.padding = padding;
    }
    layout
}

struct Session {
    bridge: Bridge,
    hal: Rc<RefCell<RecordingHal>>,
    host: Rc<RefCell<EchoHost>>,
}

impl Session {
    /// Prints what the platform and the host object saw since the last flush.
    fn flush(&self) -> Result<(), CliError> {
        for event in self.hal.borrow_mut().take_events() {
            println!(
                "EVENT:{}",
                serde_json::to_string(&event).map_err(map_cli_output_json)?
            );
        }
        for call in self.host.borrow_mut().take_calls() {
            println!(
                "CALLBACK:{}",
                serde_json::to_string(&call).map_err(map_cli_output_json)?
            );
        }
        Ok(())
    }
}

fn status_error(status: i32) -> CliError {
    CliError::new(
        "CLI_SCRIPT_STATUS",
        format!("script finished with status {}", status),
    )
}

pub(crate) fn run_script(args: RunArgs) -> Result<i32, CliError> {
    let script_path = resolve_script(&args.script)?;
    let source = fs::read(&script_path).map_err(map_cli_script_read)?;
    let assets_dir = match &args.assets_dir {
        Some(dir) => PathBuf::from(dir),
        None => script_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };

    let hal = Rc::new(RefCell::new(
        RecordingHal::new().with_assets_dir(assets_dir),
    ));
    let host = Rc::new(RefCell::new(EchoHost::default()));
    let bridge = Bridge::new(BridgeOptions {
        callback: Some(HostRef::new(Rc::clone(&host))),
        exposed_name: Some(args.callback_name.clone()),
        hal: Some(hal.clone()),
        layout: layout_from(&args),
    })
    .map_err(map_cli_bridge)?;
    let session = Session { bridge, hal, host };

    info!(script = %script_path.display(), "running script");
    let status = session.bridge.eval(Program::Bytes(source));
    session.flush()?;
    println!("STATUS:{}", status);
    if status != STATUS_OK {
        return Err(status_error(status));
    }

    for name in &args.click {
        let widget = session.bridge.find_widget(name).ok_or_else(|| {
            CliError::new(
                "CLI_CLICK_UNKNOWN",
                format!("No widget named \"{}\".", name),
            )
        })?;
        match session.bridge.dispatch(widget.id) {
            Some(status) => {
                session.flush()?;
                println!("CLICK:{}:{}", name, status);
                if status != STATUS_OK {
                    return Err(status_error(status));
                }
            }
            None => {
                warn!(widget = %name, "click on a widget without logic");
                println!("CLICK:{}:unbound", name);
            }
        }
    }

    println!("RESULT:OK");
    Ok(0)
}
