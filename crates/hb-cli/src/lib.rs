use std::ffi::OsString;

use clap::Parser;

mod cli_args;
mod error_map;
mod runner;

pub(crate) use cli_args::{Cli, Mode, RunArgs};
pub(crate) use error_map::{
    emit_error, map_cli_bridge, map_cli_output_json, map_cli_script_path, map_cli_script_read,
    CliError,
};

/// Log filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "hb_cli=info,hb_runtime=warn";

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, CliError> {
    match cli.command {
        Mode::Run(args) => runner::run_script(args),
    }
}
