mod case;
mod runner;
mod source;

pub use case::{TestAction, TestCase, TESTCASE_SCHEMA_V1};
pub use runner::{assert_case, normalize_widget_ids, run_case, RunReport};
pub use source::{discover_cases, read_test_case, CASE_FILE_NAME};

use std::path::PathBuf;

use hb_api::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HbToolError {
    #[error("Failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse testcase {path}: {source}")]
    ParseCase {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid testcase schema version \"{found}\", expected \"{expected}\".")]
    InvalidSchemaVersion { expected: String, found: String },
    #[error("No testcase.json files under {path}.")]
    CasesEmpty { path: PathBuf },
    #[error("Bridge error: {0}")]
    Bridge(#[from] ApiError),
    #[error("Action {action_index}: no widget named \"{name}\".")]
    UnknownWidget { action_index: usize, name: String },
    #[error("Action {action_index}: widget \"{name}\" has no logic bound.")]
    ActionUnbound { action_index: usize, name: String },
    #[error("Action {action_index}: logic of \"{name}\" finished with status {status}.")]
    ActionFailed {
        action_index: usize,
        name: String,
        status: i32,
    },
    #[error("Expected status {expected}, actual {actual}.")]
    StatusMismatch { expected: i32, actual: i32 },
    #[error("Expected event count {expected}, actual {actual}. observed={observed}")]
    EventCountMismatch {
        expected: usize,
        actual: usize,
        observed: String,
    },
    #[error("Event mismatch at index {index}. expected={expected} actual={actual}")]
    EventMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
    #[error("Callback calls differ. expected={expected} actual={actual}")]
    CallbackMismatch { expected: String, actual: String },
    #[error("Failed to serialize for diff: {0}")]
    Serialize(serde_json::Error),
}

impl HbToolError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ReadFile { .. } => "TOOL_READ_FILE",
            Self::ParseCase { .. } => "TOOL_PARSE_CASE",
            Self::InvalidSchemaVersion { .. } => "TOOL_SCHEMA_VERSION",
            Self::CasesEmpty { .. } => "TOOL_CASES_EMPTY",
            Self::Bridge(error) => error.code(),
            Self::UnknownWidget { .. } => "TOOL_UNKNOWN_WIDGET",
            Self::ActionUnbound { .. } => "TOOL_ACTION_UNBOUND",
            Self::ActionFailed { .. } => "TOOL_ACTION_FAILED",
            Self::StatusMismatch { .. } => "TOOL_STATUS_MISMATCH",
            Self::EventCountMismatch { .. } => "TOOL_EVENT_COUNT",
            Self::EventMismatch { .. } => "TOOL_EVENT_MISMATCH",
            Self::CallbackMismatch { .. } => "TOOL_CALLBACK_MISMATCH",
            Self::Serialize(_) => "TOOL_SERIALIZE",
        }
    }
}
