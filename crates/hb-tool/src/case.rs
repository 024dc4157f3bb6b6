use hb_api::{HalEvent, Value};
use serde::{Deserialize, Serialize};

pub const TESTCASE_SCHEMA_V1: &str = "hb-tool-case.v1";

/// One recorded run: evaluate `script`, replay `actions`, then compare what
/// the platform layer and the exposed host object saw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    #[serde(default = "default_script")]
    pub script: String,
    #[serde(default = "default_callback_name")]
    pub callback_name: String,
    #[serde(default)]
    pub actions: Vec<TestAction>,
    #[serde(default)]
    pub expected_status: i32,
    #[serde(default)]
    pub expected_events: Vec<HalEvent>,
    /// Argument lists of every `callback(...)` call, when the case checks them.
    #[serde(default)]
    pub expected_callbacks: Option<Vec<Vec<Value>>>,
}

fn default_script() -> String {
    "main.rhai".to_string()
}

fn default_callback_name() -> String {
    "tc".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TestAction {
    Click {
        name: String,
    },
    Event {
        name: String,
        #[serde(default)]
        payload: Value,
    },
}

impl TestAction {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Click { .. } => "click",
            Self::Event { .. } => "event",
        }
    }

    pub fn target(&self) -> &str {
        match self {
            Self::Click { name } | Self::Event { name, .. } => name,
        }
    }
}
