use std::fmt;

use hb_core::{Program, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Vertical,
    Horizontal,
    Button,
    Label,
    Input,
    Table,
}

impl Tag {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "vertical" => Some(Self::Vertical),
            "horizontal" => Some(Self::Horizontal),
            "button" => Some(Self::Button),
            "label" => Some(Self::Label),
            "input" => Some(Self::Input),
            "table" => Some(Self::Table),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Vertical => "vertical",
            Self::Horizontal => "horizontal",
            Self::Button => "button",
            Self::Label => "label",
            Self::Input => "input",
            Self::Table => "table",
        }
    }

    pub fn is_container(self) -> bool {
        matches!(self, Self::Vertical | Self::Horizontal)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    pub name: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
    pub logic: Option<Program>,
    pub list: Option<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiDescriptor {
    pub tag: Tag,
    pub attributes: Attributes,
    pub children: Vec<UiDescriptor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDescriptor {
    pub descriptor: UiDescriptor,
    /// Problems in nested elements that were skipped instead of failing the tree.
    pub warnings: Vec<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("descriptor must be a list, found {found}")]
    NotAList { found: &'static str },
    #[error("descriptor is empty")]
    Empty,
    #[error("descriptor tag must be a string, found {found}")]
    TagNotString { found: &'static str },
    #[error("unknown tag \"{0}\"")]
    UnknownTag(String),
    #[error("attribute \"{name}\" expects {expected}, found {found}")]
    BadAttribute {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("unknown attribute \"{0}\"")]
    UnknownAttribute(String),
    #[error("leaf \"{0}\" cannot have children")]
    LeafChildren(Tag),
    #[error("container \"{tag}\" ignores attribute \"{name}\"")]
    ContainerAttribute { tag: Tag, name: &'static str },
    #[error("unexpected {found} element")]
    UnexpectedElement { found: &'static str },
}

/// Reads a script-authored descriptor: a list whose first element is the tag,
/// followed by attribute maps and nested child lists.
pub fn parse_descriptor(value: &Value) -> Result<ParsedDescriptor, DescriptorError> {
    let mut warnings = Vec::new();
    let descriptor = parse_node(value, "", &mut warnings)?;
    Ok(ParsedDescriptor {
        descriptor,
        warnings,
    })
}

fn parse_node(
    value: &Value,
    parent_path: &str,
    warnings: &mut Vec<String>,
) -> Result<UiDescriptor, DescriptorError> {
    let Value::List(items) = value else {
        return Err(DescriptorError::NotAList {
            found: value.type_name(),
        });
    };
    let Some(first) = items.first() else {
        return Err(DescriptorError::Empty);
    };
    let Value::String(tag_name) = first else {
        return Err(DescriptorError::TagNotString {
            found: first.type_name(),
        });
    };
    let tag = Tag::parse(tag_name).ok_or_else(|| DescriptorError::UnknownTag(tag_name.clone()))?;
    let path = if parent_path.is_empty() {
        tag.name().to_string()
    } else {
        format!("{}/{}", parent_path, tag.name())
    };

    let mut attributes = Attributes::default();
    let mut children = Vec::new();

    for (index, item) in items.iter().enumerate().skip(1) {
        match item {
            Value::Map(entries) => {
                for (key, entry) in entries {
                    if let Err(error) = apply_attribute(&mut attributes, key, entry) {
                        warnings.push(format!("{}: {}", path, error));
                    }
                }
            }
            Value::List(_) if !tag.is_container() => {
                warnings.push(format!(
                    "{}[{}]: {}",
                    path,
                    index,
                    DescriptorError::LeafChildren(tag)
                ));
            }
            Value::List(_) => match parse_node(item, &path, warnings) {
                Ok(child) => children.push(child),
                Err(error) => warnings.push(format!("{}[{}]: {}", path, index, error)),
            },
            other => warnings.push(format!(
                "{}[{}]: {}",
                path,
                index,
                DescriptorError::UnexpectedElement {
                    found: other.type_name(),
                }
            )),
        }
    }

    if tag.is_container() {
        drop_container_attributes(tag, &mut attributes, &path, warnings);
    }

    Ok(UiDescriptor {
        tag,
        attributes,
        children,
    })
}

/// Containers are not platform widgets: only `name` survives, as a label for
/// diagnostics.
fn drop_container_attributes(
    tag: Tag,
    attributes: &mut Attributes,
    path: &str,
    warnings: &mut Vec<String>,
) {
    let dropped = [
        ("text", attributes.text.take().is_some()),
        ("image", attributes.image.take().is_some()),
        ("logic", attributes.logic.take().is_some()),
        ("list", attributes.list.take().is_some()),
    ];
    for (name, present) in dropped {
        if present {
            warnings.push(format!(
                "{}: {}",
                path,
                DescriptorError::ContainerAttribute { tag, name }
            ));
        }
    }
}

fn apply_attribute(
    attributes: &mut Attributes,
    key: &str,
    value: &Value,
) -> Result<(), DescriptorError> {
    let bad = |expected: &'static str| DescriptorError::BadAttribute {
        name: key.to_string(),
        expected,
        found: value.type_name(),
    };
    match key {
        "name" => {
            attributes.name = Some(value.as_str().ok_or_else(|| bad("string"))?.to_string());
        }
        "text" => {
            attributes.text = match value {
                Value::String(text) => Some(text.clone()),
                Value::Int(_) | Value::Float(_) | Value::Bool(_) => Some(value.to_text()),
                _ => return Err(bad("string")),
            };
        }
        "image" => {
            attributes.image = Some(value.as_str().ok_or_else(|| bad("string"))?.to_string());
        }
        "logic" => {
            attributes.logic = match Program::from_logic(value) {
                None => None,
                Some(Ok(program)) => Some(program),
                Some(Err(_)) => return Err(bad("string or bytes")),
            };
        }
        "list" => {
            attributes.list = Some(value.as_list().ok_or_else(|| bad("list"))?.to_vec());
        }
        other => return Err(DescriptorError::UnknownAttribute(other.to_string())),
    }
    Ok(())
}
