use serde::{Deserialize, Serialize};

pub const DEFAULT_SPACING: i64 = 10;
pub const DEFAULT_PADDING: i64 = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: i64,
    pub height: i64,
}

impl Size {
    pub fn new(width: i64, height: i64) -> Self {
        Self {
            width: width.max(0),
            height: height.max(0),
        }
    }
}

/// Position plus size hint. A zero width or height asks the platform to measure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Frame {
    pub fn new(origin: Point, size: Size) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
        }
    }

    pub fn at(origin: Point) -> Self {
        Self::new(origin, Size::default())
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub spacing: i64,
    pub padding: i64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            spacing: DEFAULT_SPACING,
            padding: DEFAULT_PADDING,
        }
    }
}

impl LayoutConfig {
    pub fn root_origin(&self) -> Point {
        Point::new(self.padding, self.padding)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Vertical,
    Horizontal,
}

impl Axis {
    pub fn extent(self, size: Size) -> i64 {
        match self {
            Self::Vertical => size.height,
            Self::Horizontal => size.width,
        }
    }

    pub fn cross_extent(self, size: Size) -> i64 {
        match self {
            Self::Vertical => size.width,
            Self::Horizontal => size.height,
        }
    }
}

/// Running accumulator for a stacked container: the next child's origin is
/// the base plus every earlier extent plus one spacing per earlier child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackCursor {
    axis: Axis,
    base: Point,
    spacing: i64,
    offset: i64,
    placed: usize,
    cross: i64,
}

impl StackCursor {
    pub fn new(axis: Axis, base: Point, spacing: i64) -> Self {
        Self {
            axis,
            base,
            spacing,
            offset: 0,
            placed: 0,
            cross: 0,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn next_origin(&self) -> Point {
        match self.axis {
            Axis::Vertical => Point::new(self.base.x, self.base.y.saturating_add(self.offset)),
            Axis::Horizontal => Point::new(self.base.x.saturating_add(self.offset), self.base.y),
        }
    }

    /// Offsets saturate instead of overflowing on absurd sizes or spacing.
    pub fn advance(&mut self, size: Size) {
        self.offset = self
            .offset
            .saturating_add(self.axis.extent(size))
            .saturating_add(self.spacing);
        self.cross = self.cross.max(self.axis.cross_extent(size));
        self.placed += 1;
    }

    /// Extent of everything placed so far; the trailing spacing is not counted.
    pub fn finish(&self) -> Size {
        let along = if self.placed == 0 {
            0
        } else {
            self.offset.saturating_sub(self.spacing)
        };
        match self.axis {
            Axis::Vertical => Size::new(self.cross, along),
            Axis::Horizontal => Size::new(along, self.cross),
        }
    }
}

/// Offsets along the stacking axis for children of the given extents.
pub fn stack_offsets(base: i64, extents: &[i64], spacing: i64) -> Vec<i64> {
    let mut cursor = StackCursor::new(Axis::Vertical, Point::new(0, base), spacing);
    extents
        .iter()
        .map(|extent| {
            let offset = cursor.next_origin().y;
            cursor.advance(Size::new(0, *extent));
            offset
        })
        .collect()
}
