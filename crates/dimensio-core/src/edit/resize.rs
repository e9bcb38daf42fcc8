//! Resize handles and anchored resizing.

use crate::model::{Axis, Corner};
use crate::snap::AlignLine;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Edge positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// A resize handle on a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handle {
    /// Edge midpoint handle (resizes one axis).
    Edge(Edge),
    /// Corner handle (resizes both axes).
    Corner(Corner),
}

impl Handle {
    /// The line the handle drags on each axis, `None` where it does not resize.
    pub fn moving_lines(self) -> (Option<AlignLine>, Option<AlignLine>) {
        use AlignLine::{End, Start};
        match self {
            Handle::Edge(Edge::Left) => (Some(Start), None),
            Handle::Edge(Edge::Right) => (Some(End), None),
            Handle::Edge(Edge::Top) => (None, Some(Start)),
            Handle::Edge(Edge::Bottom) => (None, Some(End)),
            Handle::Corner(Corner::TopLeft) => (Some(Start), Some(Start)),
            Handle::Corner(Corner::TopRight) => (Some(End), Some(Start)),
            Handle::Corner(Corner::BottomLeft) => (Some(Start), Some(End)),
            Handle::Corner(Corner::BottomRight) => (Some(End), Some(End)),
        }
    }

    fn moving_line(self, axis: Axis) -> Option<AlignLine> {
        let (x, y) = self.moving_lines();
        match axis {
            Axis::X => x,
            Axis::Y => y,
        }
    }

    /// Whether dragging this handle changes the extent along `axis`.
    pub fn resizes(self, axis: Axis) -> bool {
        self.moving_line(axis).is_some()
    }
}

/// What stays fixed while a frame is resized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeAnchor {
    /// The edge opposite to the dragged one.
    Opposite,
    /// The frame center.
    Center,
    /// A reference-space point, e.g. the pointer during wheel scaling.
    Point(Point),
}

/// New start coordinate for one axis.
fn anchored_start(start: f64, len: f64, new_len: f64, line: AlignLine, anchor: ResizeAnchor, pointer: f64) -> f64 {
    if new_len == len {
        return start;
    }
    match anchor {
        ResizeAnchor::Opposite => match line {
            AlignLine::Start => start + len - new_len,
            AlignLine::End => start,
            AlignLine::Center => start + (len - new_len) / 2.0,
        },
        ResizeAnchor::Center => start + (len - new_len) / 2.0,
        ResizeAnchor::Point(_) => {
            let t = if len == 0.0 { 0.5 } else { (pointer - start) / len };
            pointer - t * new_len
        }
    }
}

/// Resize `origin`/`size` through `handle` to `new_size`.
///
/// Axes the handle does not resize keep their exact position and extent.
/// `new_size` is taken as is; clamping is the caller's business.
pub fn resize_geometry(
    origin: Point,
    size: Size,
    handle: Handle,
    new_size: Size,
    anchor: ResizeAnchor,
) -> (Point, Size) {
    let pointer = match anchor {
        ResizeAnchor::Point(p) => p,
        _ => Point::ZERO,
    };
    let mut out_origin = origin;
    let mut out_size = size;
    if let Some(line) = handle.moving_line(Axis::X) {
        out_origin.x = anchored_start(origin.x, size.width, new_size.width, line, anchor, pointer.x);
        out_size.width = new_size.width;
    }
    if let Some(line) = handle.moving_line(Axis::Y) {
        out_origin.y = anchored_start(origin.y, size.height, new_size.height, line, anchor, pointer.y);
        out_size.height = new_size.height;
    }
    (out_origin, out_size)
}

/// [`resize_geometry`] on a rectangle.
pub fn resized_rect(rect: Rect, handle: Handle, new_size: Size, anchor: ResizeAnchor) -> Rect {
    let rect = rect.abs();
    let (origin, size) = resize_geometry(rect.origin(), rect.size(), handle, new_size, anchor);
    Rect::from_origin_size(origin, size)
}

/// Scale both extents of `rect` to `new_size`, keeping `pointer` fixed.
///
/// The point under the pointer keeps its relative position inside the
/// rectangle, so repeated wheel steps zoom around it.
pub fn scaled_about(rect: Rect, pointer: Point, new_size: Size) -> Rect {
    resized_rect(
        rect,
        Handle::Corner(Corner::BottomRight),
        new_size,
        ResizeAnchor::Point(pointer),
    )
}
