//! Gap (gutter) measurement between frames.

use crate::model::{Axis, Frame, FrameId, Project};
use kurbo::{Point, Rect};

/// Spacing between two rectangles on both axes.
///
/// Each component is `max(a.start, b.start) - min(a.end, b.end)`: positive
/// when the rectangles are apart on that axis, zero when edges touch and
/// negative (the overlap depth) when they overlap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gap {
    pub horizontal: f64,
    pub vertical: f64,
}

impl Gap {
    pub fn along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.horizontal,
            Axis::Y => self.vertical,
        }
    }

    /// Whether the rectangles overlap on both axes.
    pub fn is_overlapping(&self) -> bool {
        self.horizontal < 0.0 && self.vertical < 0.0
    }
}

/// Gap between two rectangles. Symmetric in its arguments.
pub fn gap_between(a: Rect, b: Rect) -> Gap {
    let (a, b) = (a.abs(), b.abs());
    Gap {
        horizontal: a.x0.max(b.x0) - a.x1.min(b.x1),
        vertical: a.y0.max(b.y0) - a.y1.min(b.y1),
    }
}

/// Gap between two frames.
pub fn gap(a: &Frame, b: &Frame) -> Gap {
    gap_between(a.bounds(), b.bounds())
}

/// Gap between two frames of `project`, if both exist.
pub fn frame_gap(project: &Project, a: FrameId, b: FrameId) -> Option<Gap> {
    Some(gap(project.frame(a)?, project.frame(b)?))
}

/// A distance segment for the measurement overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasureLine {
    pub start: Point,
    pub end: Point,
    pub distance: f64,
}

impl MeasureLine {
    /// Where the distance label goes.
    pub fn midpoint(&self) -> Point {
        self.start.midpoint(self.end)
    }
}

/// Segments drawn between a source and a target rectangle.
///
/// A segment exists only for an axis on which the rectangles are strictly
/// apart. It runs between the facing edges along the target's center line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Measurement {
    pub horizontal: Option<MeasureLine>,
    pub vertical: Option<MeasureLine>,
}

impl Measurement {
    pub fn is_empty(&self) -> bool {
        self.horizontal.is_none() && self.vertical.is_none()
    }
}

/// Measurement segments from `source` to `target`.
pub fn measure(source: Rect, target: Rect) -> Measurement {
    let (source, target) = (source.abs(), target.abs());
    let center = target.center();

    let horizontal = if source.x1 < target.x0 {
        Some((source.x1, target.x0))
    } else if target.x1 < source.x0 {
        Some((target.x1, source.x0))
    } else {
        None
    }
    .map(|(from, to)| MeasureLine {
        start: Point::new(from, center.y),
        end: Point::new(to, center.y),
        distance: to - from,
    });

    let vertical = if source.y1 < target.y0 {
        Some((source.y1, target.y0))
    } else if target.y1 < source.y0 {
        Some((target.y1, source.y0))
    } else {
        None
    }
    .map(|(from, to)| MeasureLine {
        start: Point::new(center.x, from),
        end: Point::new(center.x, to),
        distance: to - from,
    });

    Measurement {
        horizontal,
        vertical,
    }
}

/// Measure from `source` to the topmost other visible frame under `pointer`.
pub fn measure_to_point(
    project: &Project,
    source: FrameId,
    pointer: Point,
) -> Option<(FrameId, Measurement)> {
    let from = project.frame(source)?.bounds();
    let target = project
        .frames_at_point(pointer)
        .into_iter()
        .find(|&id| id != source)?;
    let to = project.frame(target)?.bounds();
    Some((target, measure(from, to)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FrameColor, Layer};

    #[test]
    fn test_disjoint_gap() {
        let a = Rect::new(0.0, 0.0, 100.0, 50.0);
        let b = Rect::new(120.0, 80.0, 200.0, 150.0);
        let g = gap_between(a, b);
        assert_eq!(g.horizontal, 20.0);
        assert_eq!(g.vertical, 30.0);
        assert!(!g.is_overlapping());
    }

    #[test]
    fn test_touching_and_overlapping() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let touching = Rect::new(100.0, 0.0, 150.0, 100.0);
        assert_eq!(gap_between(a, touching).horizontal, 0.0);

        let overlapping = Rect::new(90.0, 40.0, 150.0, 60.0);
        let g = gap_between(a, overlapping);
        assert_eq!(g.horizontal, -10.0);
        // b is fully inside a vertically: overlap depth is b's height.
        assert_eq!(g.vertical, -20.0);
        assert!(g.is_overlapping());
    }

    #[test]
    fn test_gap_is_symmetric() {
        let rects = [
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(5.0, 20.0, 30.0, 25.0),
            Rect::new(-40.0, -5.0, -1.0, 3.5),
            Rect::new(2.0, 2.0, 8.0, 8.0),
            Rect::new(10.0, 10.0, 10.0, 40.0),
        ];
        for &a in &rects {
            for &b in &rects {
                assert_eq!(gap_between(a, b), gap_between(b, a));
            }
        }
    }

    #[test]
    fn test_measure_lines() {
        let source = Rect::new(0.0, 0.0, 100.0, 100.0);
        let target = Rect::new(150.0, 20.0, 250.0, 60.0);
        let m = measure(source, target);
        let h = m.horizontal.expect("horizontal line");
        assert_eq!(h.start, Point::new(100.0, 40.0));
        assert_eq!(h.end, Point::new(150.0, 40.0));
        assert_eq!(h.distance, 50.0);
        assert_eq!(h.midpoint(), Point::new(125.0, 40.0));
        assert!(m.vertical.is_none());

        let above = Rect::new(10.0, -80.0, 50.0, -30.0);
        let m = measure(source, above);
        let v = m.vertical.expect("vertical line");
        assert_eq!(v.start, Point::new(30.0, -30.0));
        assert_eq!(v.end, Point::new(30.0, 0.0));
        assert_eq!(v.distance, 30.0);
    }

    #[test]
    fn test_touching_has_no_line() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(100.0, 0.0, 200.0, 100.0);
        assert!(measure(a, b).is_empty());
    }

    #[test]
    fn test_measure_to_point() {
        let mut project = Project::new();
        let layer = Layer::new("Layer 1", FrameColor::default());
        let layer_id = layer.id();
        project.insert_layer(layer);
        let a = Frame::new(layer_id, Rect::new(0.0, 0.0, 50.0, 50.0));
        let b = Frame::new(layer_id, Rect::new(80.0, 0.0, 120.0, 50.0));
        let (a_id, b_id) = (a.id(), b.id());
        project.insert_frame(a);
        project.insert_frame(b);

        let (target, m) = measure_to_point(&project, a_id, Point::new(100.0, 25.0)).expect("target");
        assert_eq!(target, b_id);
        assert_eq!(m.horizontal.map(|l| l.distance), Some(30.0));

        assert!(measure_to_point(&project, a_id, Point::new(25.0, 25.0)).is_none());
        assert_eq!(
            frame_gap(&project, a_id, b_id).map(|g| g.horizontal),
            Some(30.0)
        );
    }
}
