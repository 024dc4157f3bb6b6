pub mod descriptor;
pub mod layout;
pub mod widget;

pub use descriptor::{
    parse_descriptor, Attributes, DescriptorError, ParsedDescriptor, Tag, UiDescriptor,
};
pub use layout::{stack_offsets, Axis, Frame, LayoutConfig, Point, Size, StackCursor};
pub use widget::{LifecycleError, WidgetKind, WidgetState};
