use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use hb_core::{Value, WidgetId};
use hb_ui::{Frame, Point, Size};
use serde::{Deserialize, Serialize};

use super::{Hal, HalError};

pub const RECORDING_WINDOW: Size = Size {
    width: 600,
    height: 800,
};

const CHAR_WIDTH: i64 = 8;
const LINE_HEIGHT: i64 = 16;
const ROW_HEIGHT: i64 = 24;
const IMAGE_EDGE: i64 = 48;
// Platform widgets carry borders and insets beyond their content.
const FUDGE: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HalEvent {
    Window {
        width: i64,
        height: i64,
    },
    Read {
        path: String,
        found: bool,
    },
    Button {
        id: i64,
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image: Option<String>,
    },
    Label {
        id: i64,
        x: i64,
        y: i64,
        text: String,
    },
    Input {
        id: i64,
        x: i64,
        y: i64,
    },
    Table {
        id: i64,
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        values: Vec<Value>,
    },
    Place {
        id: i64,
        x: i64,
        y: i64,
        width: i64,
        height: i64,
    },
    SetText {
        id: i64,
        text: String,
    },
    Print {
        text: String,
    },
}

#[derive(Debug, Clone)]
enum Assets {
    Memory(BTreeMap<String, String>),
    Dir(PathBuf),
}

/// Headless platform with fixed text metrics. Records every call as a
/// [`HalEvent`] so runs can be compared line by line.
#[derive(Debug, Clone)]
pub struct RecordingHal {
    window: Size,
    assets: Assets,
    created: BTreeSet<WidgetId>,
    events: Vec<HalEvent>,
}

impl Default for RecordingHal {
    fn default() -> Self {
        Self {
            window: RECORDING_WINDOW,
            assets: Assets::Memory(BTreeMap::new()),
            created: BTreeSet::new(),
            events: Vec::new(),
        }
    }
}

impl RecordingHal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, window: Size) -> Self {
        self.window = window;
        self
    }

    pub fn with_assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.assets = Assets::Dir(dir.into());
        self
    }

    /// Adds an in-memory asset. Replaces a configured assets directory.
    pub fn with_asset(mut self, path: &str, content: &str) -> Self {
        let mut assets = match self.assets {
            Assets::Memory(assets) => assets,
            Assets::Dir(_) => BTreeMap::new(),
        };
        assets.insert(path.to_string(), content.to_string());
        self.assets = Assets::Memory(assets);
        self
    }

    pub fn events(&self) -> &[HalEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<HalEvent> {
        std::mem::take(&mut self.events)
    }

    fn load(&self, path: &str) -> io::Result<String> {
        match &self.assets {
            Assets::Memory(assets) => assets.get(path).cloned().ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("no asset {}", path))
            }),
            Assets::Dir(dir) => fs::read_to_string(resolve(dir, path)?),
        }
    }

    fn has_asset(&self, path: &str) -> bool {
        match &self.assets {
            Assets::Memory(assets) => assets.contains_key(path),
            Assets::Dir(dir) => resolve(dir, path).map(|path| path.is_file()).unwrap_or(false),
        }
    }

    fn text_size(text: &str) -> Size {
        Size::new(
            text.chars().count() as i64 * CHAR_WIDTH + FUDGE,
            LINE_HEIGHT + FUDGE,
        )
    }

    fn ensure_created(&self, operation: &'static str, id: WidgetId) -> Result<(), HalError> {
        if self.created.contains(&id) {
            Ok(())
        } else {
            Err(HalError::new(operation, format!("no widget {}", id)))
        }
    }
}

fn resolve(dir: &Path, path: &str) -> io::Result<PathBuf> {
    let relative = Path::new(path);
    if relative.is_absolute()
        || relative
            .components()
            .any(|component| matches!(component, std::path::Component::ParentDir))
    {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            format!("asset path {} leaves the assets directory", path),
        ));
    }
    Ok(dir.join(relative))
}

fn measured(hint: i64, natural: i64) -> i64 {
    if hint > 0 {
        hint
    } else {
        natural
    }
}

impl Hal for RecordingHal {
    fn read(&mut self, path: &str) -> io::Result<String> {
        let result = self.load(path);
        self.events.push(HalEvent::Read {
            path: path.to_string(),
            found: result.is_ok(),
        });
        result
    }

    fn window(&mut self, _width: i64, _height: i64) -> Size {
        self.events.push(HalEvent::Window {
            width: self.window.width,
            height: self.window.height,
        });
        self.window
    }

    fn button(
        &mut self,
        id: WidgetId,
        frame: Frame,
        text: Option<&str>,
        image: Option<&str>,
    ) -> Result<Size, HalError> {
        if let Some(image) = image {
            if !self.has_asset(image) {
                return Err(HalError::new("button", format!("image {} not found", image)));
            }
        }
        let natural = match (text, image) {
            (Some(text), _) => Self::text_size(text),
            (None, Some(_)) => Size::new(IMAGE_EDGE + FUDGE, IMAGE_EDGE + FUDGE),
            (None, None) => Self::text_size(""),
        };
        let size = Size::new(
            measured(frame.width, natural.width),
            measured(frame.height, natural.height),
        );
        self.created.insert(id);
        self.events.push(HalEvent::Button {
            id: id.0,
            x: frame.x,
            y: frame.y,
            width: size.width,
            height: size.height,
            text: text.map(str::to_string),
            image: image.map(str::to_string),
        });
        Ok(size)
    }

    fn label(&mut self, id: WidgetId, origin: Point, text: &str) -> Result<Size, HalError> {
        self.created.insert(id);
        self.events.push(HalEvent::Label {
            id: id.0,
            x: origin.x,
            y: origin.y,
            text: text.to_string(),
        });
        Ok(Self::text_size(text))
    }

    fn input(&mut self, id: WidgetId, origin: Point) -> Result<Size, HalError> {
        self.created.insert(id);
        self.events.push(HalEvent::Input {
            id: id.0,
            x: origin.x,
            y: origin.y,
        });
        Ok(Size::new(self.window.width / 2, LINE_HEIGHT + FUDGE))
    }

    fn table(&mut self, id: WidgetId, frame: Frame, values: &[Value]) -> Result<Size, HalError> {
        let size = Size::new(
            measured(frame.width, self.window.width / 2),
            measured(frame.height, values.len() as i64 * ROW_HEIGHT),
        );
        self.created.insert(id);
        self.events.push(HalEvent::Table {
            id: id.0,
            x: frame.x,
            y: frame.y,
            width: size.width,
            height: size.height,
            values: values.to_vec(),
        });
        Ok(size)
    }

    fn place(&mut self, id: WidgetId, frame: Frame) -> Result<(), HalError> {
        self.ensure_created("place", id)?;
        self.events.push(HalEvent::Place {
            id: id.0,
            x: frame.x,
            y: frame.y,
            width: frame.width,
            height: frame.height,
        });
        Ok(())
    }

    fn set_text(&mut self, id: WidgetId, text: &str) -> Result<(), HalError> {
        self.ensure_created("set_text", id)?;
        self.events.push(HalEvent::SetText {
            id: id.0,
            text: text.to_string(),
        });
        Ok(())
    }

    fn print(&mut self, line: &str) {
        self.events.push(HalEvent::Print {
            text: line.to_string(),
        });
    }
}
