use std::fmt::Display;

use hb_api::ApiError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub(crate) struct CliError {
    pub(crate) code: &'static str,
    pub(crate) message: String,
}

impl CliError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

fn map_error(code: &'static str, error: impl Display) -> CliError {
    CliError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: CliError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).unwrap_or_else(|_| "\"\"".to_string())
    );
    1
}

pub(crate) fn map_cli_script_path(error: std::io::Error) -> CliError {
    map_error("CLI_SCRIPT_PATH", error)
}

pub(crate) fn map_cli_script_read(error: std::io::Error) -> CliError {
    map_error("CLI_SCRIPT_READ", error)
}

pub(crate) fn map_cli_output_json(error: serde_json::Error) -> CliError {
    map_error("CLI_OUTPUT_JSON", error)
}

pub(crate) fn map_cli_bridge(error: ApiError) -> CliError {
    CliError::new(error.code(), error.to_string())
}
