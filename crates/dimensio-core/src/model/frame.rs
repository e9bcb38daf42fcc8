//! Frame: a measured rectangle with independently rounded corners.

use super::{FrameColor, FrameId, LayerId};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// All corners in file order (tl, tr, bl, br).
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];
}

/// Per-corner radii.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CornerRadii {
    pub tl: f64,
    pub tr: f64,
    pub bl: f64,
    pub br: f64,
}

impl CornerRadii {
    /// Sharp corners.
    pub const ZERO: Self = Self::uniform(0.0);

    /// Same radius on every corner.
    pub const fn uniform(radius: f64) -> Self {
        Self {
            tl: radius,
            tr: radius,
            bl: radius,
            br: radius,
        }
    }

    /// Largest radius allowed on a `width` x `height` frame.
    pub fn limit(width: f64, height: f64) -> f64 {
        (width.min(height) / 2.0).max(0.0)
    }

    pub fn get(&self, corner: Corner) -> f64 {
        match corner {
            Corner::TopLeft => self.tl,
            Corner::TopRight => self.tr,
            Corner::BottomLeft => self.bl,
            Corner::BottomRight => self.br,
        }
    }

    pub fn set(&mut self, corner: Corner, value: f64) {
        match corner {
            Corner::TopLeft => self.tl = value,
            Corner::TopRight => self.tr = value,
            Corner::BottomLeft => self.bl = value,
            Corner::BottomRight => self.br = value,
        }
    }

    /// Radii in file order (tl, tr, bl, br).
    pub fn values(&self) -> [f64; 4] {
        [self.tl, self.tr, self.bl, self.br]
    }

    /// Clamp every corner into `[0, min(width, height) / 2]`. NaN becomes 0.
    pub fn clamped_to(self, width: f64, height: f64) -> Self {
        let limit = Self::limit(width, height);
        let clamp = |v: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, limit) };
        Self {
            tl: clamp(self.tl),
            tr: clamp(self.tr),
            bl: clamp(self.bl),
            br: clamp(self.br),
        }
    }

    /// Whether every corner respects the limit for the given extents.
    pub fn fits(&self, width: f64, height: f64) -> bool {
        let limit = Self::limit(width, height);
        self.values().iter().all(|&v| (0.0..=limit).contains(&v))
    }

    /// Whether any corner is rounded.
    pub fn is_active(&self) -> bool {
        self.values().iter().any(|&v| v > 0.0)
    }

    pub fn is_uniform(&self) -> bool {
        self.tl == self.tr && self.tr == self.bl && self.bl == self.br
    }
}

/// A rectangular measuring frame.
///
/// Geometry is expressed in virtual desktop pixels. Fields are only
/// writable inside the crate; all public mutation goes through
/// [`Session`](crate::edit::Session), which keeps the invariants.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub(crate) id: FrameId,
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) radius: CornerRadii,
    pub(crate) color: FrameColor,
    pub(crate) name: String,
    pub(crate) locked: bool,
    pub(crate) visible: bool,
    pub(crate) filled: bool,
    pub(crate) z_order: i64,
    pub(crate) layer_id: LayerId,
}

impl Frame {
    /// Create a new frame covering `bounds` inside `layer_id`.
    ///
    /// Inverted bounds are normalized; the frame starts unlocked, visible,
    /// filled, with sharp corners and z-order 0.
    pub fn new(layer_id: LayerId, bounds: Rect) -> Self {
        let bounds = bounds.abs();
        Self::with_geometry(layer_id, bounds.origin(), bounds.size())
    }

    /// Create a frame from an exact origin and size.
    ///
    /// Unlike [`new`](Self::new) the extent is stored as given, not
    /// recomputed from edge coordinates.
    pub(crate) fn with_geometry(layer_id: LayerId, origin: Point, size: Size) -> Self {
        Self {
            id: Uuid::new_v4(),
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
            radius: CornerRadii::ZERO,
            color: FrameColor::default(),
            name: String::from("Frame"),
            locked: false,
            visible: true,
            filled: true,
            z_order: 0,
            layer_id,
        }
    }

    /// Reconstruct a frame with a specific ID (for storage).
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn reconstruct(
        id: FrameId,
        origin: Point,
        size: Size,
        radius: CornerRadii,
        color: FrameColor,
        name: String,
        locked: bool,
        visible: bool,
        filled: bool,
        z_order: i64,
        layer_id: LayerId,
    ) -> Self {
        Self {
            id,
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
            radius,
            color,
            name,
            locked,
            visible,
            filled,
            z_order,
            layer_id,
        }
    }

    pub fn id(&self) -> FrameId {
        self.id
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn radius(&self) -> CornerRadii {
        self.radius
    }

    pub fn color(&self) -> &FrameColor {
        &self.color
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether the overlay is painted with a translucent fill.
    pub fn is_filled(&self) -> bool {
        self.filled
    }

    pub fn z_order(&self) -> i64 {
        self.z_order
    }

    pub fn layer_id(&self) -> LayerId {
        self.layer_id
    }

    /// Top-left corner.
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Bounding box in reference coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.origin(), self.size())
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Check if a point lies inside the frame.
    pub fn hit_test(&self, point: Point) -> bool {
        self.bounds().contains(point)
    }

    /// Human readable size summary, as copied to the clipboard.
    pub fn dimensions_text(&self) -> String {
        let mut text = format!("W: {}px; H: {}px;", self.width, self.height);
        if self.radius.is_active() {
            let r = self.radius;
            if r.is_uniform() {
                text.push_str(&format!(" Radius: {}px;", r.tl));
            } else {
                text.push_str(&format!(
                    " Radius: TL:{}, TR:{}, BL:{}, BR:{};",
                    r.tl, r.tr, r.bl, r.br
                ));
            }
        }
        text
    }

    /// Replace position and extent, then re-clamp the radii.
    pub(crate) fn set_geometry(&mut self, origin: Point, size: Size) {
        self.x = origin.x;
        self.y = origin.y;
        self.width = size.width;
        self.height = size.height;
        self.radius = self.radius.clamped_to(self.width, self.height);
    }
}
