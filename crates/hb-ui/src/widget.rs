use hb_core::WidgetId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::descriptor::Tag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Button,
    Label,
    Input,
    Table,
}

impl WidgetKind {
    pub fn from_tag(tag: Tag) -> Option<Self> {
        match tag {
            Tag::Button => Some(Self::Button),
            Tag::Label => Some(Self::Label),
            Tag::Input => Some(Self::Input),
            Tag::Table => Some(Self::Table),
            Tag::Vertical | Tag::Horizontal => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Label => "label",
            Self::Input => "input",
            Self::Table => "table",
        }
    }

    /// Widgets whose displayed value `ui_set` may replace.
    pub fn supports_text(self) -> bool {
        matches!(self, Self::Button | Self::Label | Self::Input)
    }

    /// Widgets the platform sizes on its own rather than from their text.
    pub fn auto_measured(self) -> bool {
        matches!(self, Self::Input | Self::Table)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetState {
    Unborn,
    Created,
    Placed,
    Destroyed,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("widget {id} cannot move from {from:?} to {to:?}")]
pub struct LifecycleError {
    pub id: WidgetId,
    pub from: WidgetState,
    pub to: WidgetState,
}

impl WidgetState {
    /// Transitions only move forward; placing twice or reviving is refused.
    pub fn advance(self, id: WidgetId, to: WidgetState) -> Result<WidgetState, LifecycleError> {
        let allowed = matches!(
            (self, to),
            (Self::Unborn, Self::Created)
                | (Self::Created, Self::Placed)
                | (Self::Created, Self::Destroyed)
                | (Self::Placed, Self::Destroyed)
        );
        if allowed {
            Ok(to)
        } else {
            Err(LifecycleError { id, from: self, to })
        }
    }

    pub fn is_live(self) -> bool {
        matches!(self, Self::Created | Self::Placed)
    }
}
