//! Alignment snapping between frames.
//!
//! While a frame is dragged or resized, its left/center/right and
//! top/middle/bottom lines are compared with the same lines of every other
//! visible frame. Lines closer than the tolerance snap, and guide segments
//! describe what the overlay should draw.

use crate::edit::Handle;
use crate::model::{Axis, FrameId, Project};
use kurbo::{Point, Rect, Vec2};
use std::cmp::Ordering;

/// Snap tolerance in reference pixels.
pub const DEFAULT_SNAP_TOLERANCE: f64 = 4.0;

/// Slack for comparing coordinates that should be equal.
const EPSILON: f64 = 1e-9;

/// One of the three alignment lines of a rectangle on an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlignLine {
    /// Left or top edge.
    Start,
    /// Horizontal or vertical center.
    Center,
    /// Right or bottom edge.
    End,
}

impl AlignLine {
    pub const ALL: [AlignLine; 3] = [AlignLine::Start, AlignLine::Center, AlignLine::End];

    /// Coordinate of this line of `rect` on `axis`.
    pub fn position(self, rect: Rect, axis: Axis) -> f64 {
        let (start, end) = match axis {
            Axis::X => (rect.x0, rect.x1),
            Axis::Y => (rect.y0, rect.y1),
        };
        match self {
            AlignLine::Start => start,
            AlignLine::Center => (start + end) / 2.0,
            AlignLine::End => end,
        }
    }
}

/// The winning snap on one axis.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisSnap {
    /// Which line of the moving rectangle snapped.
    pub line: AlignLine,
    /// Coordinate the line snapped to.
    pub target: f64,
    /// Offset to add to the line to reach the target.
    pub delta: f64,
    /// `|delta|`.
    pub distance: f64,
    /// Frames that have a line exactly on `target`, sorted by id.
    pub matched: Vec<FrameId>,
}

/// A guide segment to draw.
///
/// For [`Axis::X`] the guide is a vertical line at `x = position` running
/// from `y = start` to `y = end`; for [`Axis::Y`] it is horizontal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Guide {
    pub axis: Axis,
    pub position: f64,
    pub start: f64,
    pub end: f64,
}

impl Guide {
    pub fn endpoints(&self) -> (Point, Point) {
        match self.axis {
            Axis::X => (
                Point::new(self.position, self.start),
                Point::new(self.position, self.end),
            ),
            Axis::Y => (
                Point::new(self.start, self.position),
                Point::new(self.end, self.position),
            ),
        }
    }
}

/// Result of an alignment query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignmentResult {
    pub x: Option<AxisSnap>,
    pub y: Option<AxisSnap>,
    pub guides: Vec<Guide>,
}

impl AlignmentResult {
    /// Create a result with no snapping.
    pub fn none() -> Self {
        Self::default()
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.x.is_some() || self.y.is_some()
    }

    pub fn axis(&self, axis: Axis) -> Option<&AxisSnap> {
        match axis {
            Axis::X => self.x.as_ref(),
            Axis::Y => self.y.as_ref(),
        }
    }

    /// Translation that applies both axis snaps.
    pub fn offset(&self) -> Vec2 {
        Vec2::new(
            self.x.as_ref().map_or(0.0, |s| s.delta),
            self.y.as_ref().map_or(0.0, |s| s.delta),
        )
    }

    /// `rect` moved so that its snapped lines sit on their targets.
    pub fn snapped_rect(&self, rect: Rect) -> Rect {
        rect + self.offset()
    }

    /// `rect` with only the snapped edges moved onto their targets.
    ///
    /// A snapped center line translates the rectangle on that axis.
    pub fn snapped_edges(&self, rect: Rect) -> Rect {
        let mut out = rect;
        if let Some(snap) = &self.x {
            match snap.line {
                AlignLine::Start => out.x0 += snap.delta,
                AlignLine::End => out.x1 += snap.delta,
                AlignLine::Center => {
                    out.x0 += snap.delta;
                    out.x1 += snap.delta;
                }
            }
        }
        if let Some(snap) = &self.y {
            match snap.line {
                AlignLine::Start => out.y0 += snap.delta,
                AlignLine::End => out.y1 += snap.delta,
                AlignLine::Center => {
                    out.y0 += snap.delta;
                    out.y1 += snap.delta;
                }
            }
        }
        out
    }
}

/// A candidate match while scanning.
struct Candidate {
    line: AlignLine,
    target: f64,
    delta: f64,
    distance: f64,
    frame: FrameId,
}

impl Candidate {
    /// Nearest first, then lower frame id, then line order.
    fn rank(&self, other: &Candidate) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.frame.cmp(&other.frame))
            .then_with(|| self.line.cmp(&other.line))
    }
}

/// Bounds of every visible frame other than `active`.
fn targets(project: &Project, active: Option<FrameId>) -> Vec<(FrameId, Rect)> {
    project
        .frames()
        .filter(|f| f.is_visible() && Some(f.id()) != active)
        .map(|f| (f.id(), f.bounds()))
        .collect()
}

fn snap_axis(
    targets: &[(FrameId, Rect)],
    rect: Rect,
    axis: Axis,
    lines: &[AlignLine],
    tolerance: f64,
) -> Option<AxisSnap> {
    let mut best: Option<Candidate> = None;
    for &(frame, other) in targets {
        for &line in lines {
            let own = line.position(rect, axis);
            for target_line in AlignLine::ALL {
                let target = target_line.position(other, axis);
                let delta = target - own;
                let distance = delta.abs();
                if distance > tolerance + EPSILON {
                    continue;
                }
                let candidate = Candidate {
                    line,
                    target,
                    delta,
                    distance,
                    frame,
                };
                let better = best
                    .as_ref()
                    .is_none_or(|b| candidate.rank(b) == Ordering::Less);
                if better {
                    best = Some(candidate);
                }
            }
        }
    }

    let best = best?;
    let mut matched: Vec<FrameId> = targets
        .iter()
        .filter(|(_, other)| {
            AlignLine::ALL
                .iter()
                .any(|l| (l.position(*other, axis) - best.target).abs() <= EPSILON)
        })
        .map(|(id, _)| *id)
        .collect();
    matched.sort();

    Some(AxisSnap {
        line: best.line,
        target: best.target,
        delta: best.delta,
        distance: best.distance,
        matched,
    })
}

/// Guide spanning the snapped rectangle and every matched frame.
fn guide_for(snap: &AxisSnap, axis: Axis, rect: Rect, targets: &[(FrameId, Rect)]) -> Guide {
    let span = |r: Rect| match axis {
        Axis::X => (r.y0, r.y1),
        Axis::Y => (r.x0, r.x1),
    };
    let (mut start, mut end) = span(rect);
    for (_, other) in targets.iter().filter(|(id, _)| snap.matched.contains(id)) {
        let (s, e) = span(*other);
        start = start.min(s);
        end = end.max(e);
    }
    Guide {
        axis,
        position: snap.target,
        start,
        end,
    }
}

fn resolve(
    project: &Project,
    active: Option<FrameId>,
    rect: Rect,
    x_lines: &[AlignLine],
    y_lines: &[AlignLine],
    tolerance: f64,
    translate: bool,
) -> AlignmentResult {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return AlignmentResult::none();
    }
    let targets = targets(project, active);
    let mut result = AlignmentResult {
        x: snap_axis(&targets, rect, Axis::X, x_lines, tolerance),
        y: snap_axis(&targets, rect, Axis::Y, y_lines, tolerance),
        guides: Vec::new(),
    };

    let snapped = if translate {
        result.snapped_rect(rect)
    } else {
        result.snapped_edges(rect)
    };
    let mut guides = Vec::new();
    if let Some(snap) = &result.x {
        guides.push(guide_for(snap, Axis::X, snapped, &targets));
    }
    if let Some(snap) = &result.y {
        guides.push(guide_for(snap, Axis::Y, snapped, &targets));
    }
    result.guides = guides;
    result
}

/// Align a moving rectangle against every other visible frame.
///
/// `active` is excluded from the targets. Candidates within `tolerance`
/// (inclusive) are considered; per axis the nearest wins and ties go to the
/// lower frame id.
pub fn align(
    project: &Project,
    active: Option<FrameId>,
    rect: Rect,
    tolerance: f64,
) -> AlignmentResult {
    resolve(
        project,
        active,
        rect,
        &AlignLine::ALL,
        &AlignLine::ALL,
        tolerance,
        true,
    )
}

/// Align the edges dragged by a resize `handle`.
///
/// Only the lines the handle moves are candidates, so an edge handle snaps
/// on one axis and a corner handle on both.
pub fn align_edges(
    project: &Project,
    active: Option<FrameId>,
    rect: Rect,
    handle: Handle,
    tolerance: f64,
) -> AlignmentResult {
    let (x, y) = handle.moving_lines();
    let x_lines: Vec<AlignLine> = x.into_iter().collect();
    let y_lines: Vec<AlignLine> = y.into_iter().collect();
    resolve(project, active, rect, &x_lines, &y_lines, tolerance, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::Edge;
    use crate::model::{Corner, Frame, FrameColor, Layer};

    fn project_with(rects: &[Rect]) -> (Project, Vec<FrameId>) {
        let mut project = Project::new();
        let layer = Layer::new("Layer 1", FrameColor::default());
        let layer_id = layer.id();
        project.insert_layer(layer);
        let mut ids = Vec::new();
        for (z, rect) in rects.iter().enumerate() {
            let mut frame = Frame::new(layer_id, *rect);
            frame.z_order = z as i64;
            ids.push(frame.id());
            project.insert_frame(frame);
        }
        (project, ids)
    }

    #[test]
    fn test_snaps_within_tolerance() {
        let (project, ids) = project_with(&[
            Rect::new(100.0, 0.0, 150.0, 50.0),
            Rect::new(104.0, 200.0, 180.0, 260.0),
        ]);
        let a = ids[0];
        let rect = project.frame(a).map(|f| f.bounds()).unwrap_or_default();

        let result = align(&project, Some(a), rect, 4.0);
        let x = result.x.as_ref().expect("x snap");
        assert_eq!(x.line, AlignLine::Start);
        assert_eq!(x.target, 104.0);
        assert_eq!(x.delta, 4.0);
        assert_eq!(x.matched, vec![ids[1]]);
        assert!(result.y.is_none());
        assert_eq!(result.guides.len(), 1);
        assert_eq!(result.guides[0].position, 104.0);
        assert_eq!(result.snapped_rect(rect).x0, 104.0);

        let result = align(&project, Some(a), rect, 3.0);
        assert!(!result.is_snapped());
        assert!(result.guides.is_empty());
    }

    #[test]
    fn test_nearest_candidate_wins() {
        let (project, ids) = project_with(&[
            Rect::new(0.0, 500.0, 10.0, 510.0),
            Rect::new(103.0, 0.0, 200.0, 10.0),
            Rect::new(101.0, 300.0, 200.0, 310.0),
        ]);
        let rect = Rect::new(100.0, 100.0, 130.0, 130.0);
        let result = align(&project, None, rect, 4.0);
        let x = result.x.expect("x snap");
        assert_eq!(x.target, 101.0);
        assert_eq!(x.matched, vec![ids[2]]);
    }

    #[test]
    fn test_tie_goes_to_lower_id() {
        let (project, ids) = project_with(&[
            Rect::new(102.0, 0.0, 200.0, 10.0),
            Rect::new(98.0, 300.0, 200.0, 310.0),
        ]);
        let rect = Rect::new(100.0, 100.0, 130.0, 130.0);
        let result = align(&project, None, rect, 4.0);
        let x = result.x.expect("x snap");
        let lower = ids.iter().min().copied();
        let expected = if lower == Some(ids[0]) { 102.0 } else { 98.0 };
        assert_eq!(x.target, expected);
    }

    #[test]
    fn test_center_alignment_and_guide_span() {
        let (project, ids) = project_with(&[
            Rect::new(0.0, 0.0, 100.0, 40.0),
            Rect::new(20.0, 200.0, 80.0, 240.0),
        ]);
        // Center of the moving rect is at 51, target center at 50.
        let rect = Rect::new(31.0, 100.0, 71.0, 140.0);
        let result = align(&project, None, rect, 2.0);
        let x = result.x.as_ref().expect("x snap");
        assert_eq!(x.line, AlignLine::Center);
        assert_eq!(x.target, 50.0);
        assert_eq!(x.matched, {
            let mut both = ids.clone();
            both.sort();
            both
        });
        let guide = result.guides[0];
        assert_eq!(guide.axis, Axis::X);
        assert_eq!(guide.endpoints(), (Point::new(50.0, 0.0), Point::new(50.0, 240.0)));
    }

    #[test]
    fn test_invisible_frames_ignored() {
        let (mut project, ids) = project_with(&[Rect::new(104.0, 0.0, 150.0, 50.0)]);
        if let Some(f) = project.frame_mut(ids[0]) {
            f.visible = false;
        }
        let result = align(&project, None, Rect::new(100.0, 100.0, 120.0, 120.0), 4.0);
        assert!(!result.is_snapped());
    }

    #[test]
    fn test_align_edges_only_uses_moving_edges() {
        let (project, _) = project_with(&[Rect::new(0.0, 0.0, 203.0, 50.0)]);
        // Left edge at 200 would snap to 203 on a move, but the right handle
        // only moves the right edge (at 260).
        let rect = Rect::new(200.0, 100.0, 260.0, 140.0);
        let right = Handle::Edge(Edge::Right);
        assert!(!align_edges(&project, None, rect, right, 4.0).is_snapped());

        let rect = Rect::new(100.0, 100.0, 201.0, 140.0);
        let result = align_edges(&project, None, rect, right, 4.0);
        let x = result.x.as_ref().expect("x snap");
        assert_eq!(x.line, AlignLine::End);
        assert_eq!(result.snapped_edges(rect), Rect::new(100.0, 100.0, 203.0, 140.0));
        assert!(result.y.is_none());
    }

    #[test]
    fn test_align_edges_corner_snaps_both_axes() {
        let (project, _) = project_with(&[Rect::new(0.0, 0.0, 50.0, 50.0)]);
        let rect = Rect::new(48.0, 52.0, 100.0, 100.0);
        let handle = Handle::Corner(Corner::TopLeft);
        let result = align_edges(&project, None, rect, handle, 3.0);
        assert_eq!(result.snapped_edges(rect), Rect::new(50.0, 50.0, 100.0, 100.0));
    }
}
