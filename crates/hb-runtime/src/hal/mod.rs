use std::io;

use hb_core::{Value, WidgetId};
use hb_ui::{Frame, Point, Size};
use thiserror::Error;
use tracing::info;

mod recording;

pub use recording::{HalEvent, RecordingHal, RECORDING_WINDOW};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{operation} failed: {message}")]
pub struct HalError {
    pub operation: &'static str,
    pub message: String,
}

impl HalError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

/// Platform widget layer. Ids come from the bridge; the platform measures and
/// returns the size it actually used. A zero width or height in a frame asks
/// the platform to measure that axis.
pub trait Hal {
    fn read(&mut self, path: &str) -> io::Result<String>;

    fn window(&mut self, width: i64, height: i64) -> Size;

    fn button(
        &mut self,
        id: WidgetId,
        frame: Frame,
        text: Option<&str>,
        image: Option<&str>,
    ) -> Result<Size, HalError>;

    fn label(&mut self, id: WidgetId, origin: Point, text: &str) -> Result<Size, HalError>;

    fn input(&mut self, id: WidgetId, origin: Point) -> Result<Size, HalError>;

    fn table(&mut self, id: WidgetId, frame: Frame, values: &[Value]) -> Result<Size, HalError>;

    fn place(&mut self, id: WidgetId, frame: Frame) -> Result<(), HalError>;

    fn set_text(&mut self, id: WidgetId, text: &str) -> Result<(), HalError>;

    fn print(&mut self, line: &str) {
        info!(target: "hb_runtime::print", "{}", line);
    }
}
