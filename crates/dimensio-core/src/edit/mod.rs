//! Edit coordinator: every mutation of a [`Project`] goes through here.
//!
//! A [`Session`] validates intents, applies them atomically and emits an
//! [`EditEvent`] for every change, in the order the changes were applied.

mod events;
mod resize;

pub use events::{EditEvent, EventBus};
pub use resize::{Edge, Handle, ResizeAnchor, resize_geometry, resized_rect, scaled_about};

use crate::config::EngineConfig;
use crate::model::{Axis, Corner, CornerRadii, Frame, FrameColor, FrameId, Layer, LayerId, Project};
use crate::snap::{self, AlignmentResult};
use kurbo::{Point, Rect, Size, Vec2};
use std::sync::mpsc::Receiver;
use thiserror::Error;

/// Why a geometry change was refused.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GeometryRejected {
    #[error("frame is locked")]
    Locked,
    #[error("extent must not be negative")]
    InvalidExtent,
    #[error("geometry must be finite")]
    NonFinite,
}

/// Edit errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Edit rejected: {0}")]
    Rejected(#[from] GeometryRejected),
    #[error("Unknown frame: {0}")]
    UnknownFrame(FrameId),
    #[error("Unknown layer: {0}")]
    UnknownLayer(LayerId),
    #[error("Layer {0} still contains frames")]
    LayerNotEmpty(LayerId),
}

/// Result type for edit operations.
pub type EditResult<T> = Result<T, EditError>;

/// Paint order moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZMove {
    /// On top of everything.
    Front,
    /// Below everything.
    Back,
    /// One step up.
    Forward,
    /// One step down.
    Backward,
}

/// Arrow key directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    fn unit(self) -> Vec2 {
        match self {
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::Right => Vec2::new(1.0, 0.0),
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Down => Vec2::new(0.0, 1.0),
        }
    }
}

/// Default name of the layer created for the first frame.
pub const DEFAULT_LAYER_NAME: &str = "Layer 1";

/// Owns the project and applies edits to it.
#[derive(Debug)]
pub struct Session {
    project: Project,
    config: EngineConfig,
    /// Bumped by every change that ends up in the file.
    revision: u64,
    events: EventBus,
    /// Next palette slot for new frames.
    palette_cursor: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Session {
    /// Start with an empty project.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_project(Project::new(), config)
    }

    pub fn with_project(project: Project, config: EngineConfig) -> Self {
        let palette_cursor = project.len();
        Self {
            project,
            config: config.sanitized(),
            revision: 0,
            events: EventBus::new(),
            palette_cursor,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Out-of-range values fall back to their defaults.
    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config.sanitized();
    }

    /// Monotonic change counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Receive every future [`EditEvent`].
    pub fn subscribe(&mut self) -> Receiver<EditEvent> {
        self.events.subscribe()
    }

    /// Swap in a whole project, e.g. after opening a file.
    pub fn replace_project(&mut self, project: Project) -> Project {
        let previous = std::mem::replace(&mut self.project, project);
        self.palette_cursor = self.project.len();
        self.commit(vec![EditEvent::ProjectReplaced]);
        previous
    }

    /// Record the running application as the producer, without counting it
    /// as a change.
    pub(crate) fn stamp_producer(&mut self) {
        self.project.app_version = crate::model::APP_VERSION.to_string();
    }

    fn commit(&mut self, events: Vec<EditEvent>) {
        self.revision += 1;
        for event in events {
            self.events.emit(event);
        }
    }

    fn frame(&self, id: FrameId) -> EditResult<&Frame> {
        self.project.frame(id).ok_or(EditError::UnknownFrame(id))
    }

    /// The frame, if its geometry may change.
    fn unlocked(&self, id: FrameId) -> EditResult<&Frame> {
        let frame = self.frame(id)?;
        if frame.is_locked() {
            log::debug!("Rejected geometry edit on locked frame {id}");
            return Err(GeometryRejected::Locked.into());
        }
        Ok(frame)
    }

    fn set_geometry(&mut self, id: FrameId, origin: Point, size: Size) -> EditResult<()> {
        let frame = self.unlocked(id)?;
        let finite = origin.is_finite() && size.is_finite();
        if !finite {
            return Err(GeometryRejected::NonFinite.into());
        }
        if size.width < 0.0 || size.height < 0.0 {
            return Err(GeometryRejected::InvalidExtent.into());
        }
        let before = frame.bounds();
        let radius_before = frame.radius();
        let Some(frame) = self.project.frame_mut(id) else {
            return Err(EditError::UnknownFrame(id));
        };
        frame.set_geometry(origin, size);
        let after = frame.bounds();
        let radius_after = frame.radius();

        let mut events = vec![EditEvent::GeometryChanged { id, before, after }];
        if radius_after != radius_before {
            events.push(EditEvent::RadiusChanged {
                id,
                before: radius_before,
                after: radius_after,
            });
        }
        self.commit(events);
        Ok(())
    }

    fn clamp_extent(&self, value: f64) -> f64 {
        value.max(self.config.min_extent).max(0.0)
    }

    // --- Layers ---

    /// Append a new empty layer.
    pub fn add_layer(&mut self, name: impl Into<String>, color: FrameColor) -> LayerId {
        let layer = Layer::new(name, color);
        let id = layer.id();
        self.project.insert_layer(layer);
        self.commit(vec![EditEvent::LayerChanged { id }]);
        id
    }

    pub fn rename_layer(&mut self, id: LayerId, name: impl Into<String>) -> EditResult<()> {
        let layer = self.project.layer_mut(id).ok_or(EditError::UnknownLayer(id))?;
        layer.name = name.into();
        self.commit(vec![EditEvent::LayerChanged { id }]);
        Ok(())
    }

    pub fn set_layer_color(&mut self, id: LayerId, color: FrameColor) -> EditResult<()> {
        let layer = self.project.layer_mut(id).ok_or(EditError::UnknownLayer(id))?;
        layer.color = color;
        self.commit(vec![EditEvent::LayerChanged { id }]);
        Ok(())
    }

    /// Remove an empty layer.
    pub fn remove_layer(&mut self, id: LayerId) -> EditResult<()> {
        let layer = self.project.layer(id).ok_or(EditError::UnknownLayer(id))?;
        if !layer.is_empty() {
            return Err(EditError::LayerNotEmpty(id));
        }
        self.project.layers.retain(|l| l.id != id);
        self.commit(vec![EditEvent::LayerChanged { id }]);
        Ok(())
    }

    // --- Frames ---

    /// Name `"Frame N"` that no frame uses yet.
    fn next_frame_name(&self) -> String {
        let mut n = self.project.len() + 1;
        loop {
            let name = format!("Frame {n}");
            if !self.project.frames().any(|f| f.name() == name) {
                return name;
            }
            n += 1;
        }
    }

    /// Create a frame and make it the active one.
    ///
    /// With an active frame the new one copies its radii and is placed at its
    /// geometry shifted by the duplicate offset; otherwise it gets the
    /// configured default geometry. It lands in `layer`, else the active
    /// frame's layer, else the first layer (created if there is none).
    pub fn create_frame(&mut self, layer: Option<LayerId>) -> EditResult<FrameId> {
        if let Some(layer) = layer {
            if self.project.layer(layer).is_none() {
                return Err(EditError::UnknownLayer(layer));
            }
        }

        let mut events = Vec::new();
        let active = self.project.active_frame().cloned();
        let chosen = layer
            .or_else(|| active.as_ref().map(|f| f.layer_id()))
            .or_else(|| self.project.layers().first().map(|l| l.id()));
        let layer_id = match chosen {
            Some(id) => id,
            None => {
                let layer = Layer::new(DEFAULT_LAYER_NAME, FrameColor::default());
                let id = layer.id();
                self.project.insert_layer(layer);
                events.push(EditEvent::LayerChanged { id });
                id
            }
        };

        let (origin, size, radius) = match &active {
            Some(frame) => {
                let offset = self.config.duplicate_offset;
                (
                    frame.origin() + Vec2::new(offset, offset),
                    frame.size(),
                    frame.radius(),
                )
            }
            None => (
                self.config.default_origin,
                self.config.default_size(),
                CornerRadii::ZERO,
            ),
        };

        let mut frame = Frame::with_geometry(layer_id, origin, size);
        frame.radius = radius.clamped_to(frame.width, frame.height);
        frame.color = FrameColor::palette(self.palette_cursor);
        frame.name = self.next_frame_name();
        frame.z_order = self.project.max_z_order().map_or(0, |z| z + 1);
        self.palette_cursor += 1;

        let id = frame.id();
        self.project.insert_frame(frame);
        events.push(EditEvent::FrameAdded { id, layer: layer_id });

        let previous = self.project.active_frame_id;
        self.project.active_frame_id = Some(id);
        events.push(EditEvent::SelectionChanged {
            previous,
            current: Some(id),
        });

        log::debug!("Created frame {id}");
        self.commit(events);
        Ok(id)
    }

    /// Translate a frame. No snapping.
    pub fn move_by(&mut self, id: FrameId, dx: f64, dy: f64) -> EditResult<()> {
        if !dx.is_finite() || !dy.is_finite() {
            self.unlocked(id)?;
            return Err(GeometryRejected::NonFinite.into());
        }
        let frame = self.unlocked(id)?;
        let origin = Point::new(frame.x() + dx, frame.y() + dy);
        let size = frame.size();
        self.set_geometry(id, origin, size)
    }

    /// Move by one small or large step.
    pub fn nudge(&mut self, id: FrameId, direction: Direction, large: bool) -> EditResult<()> {
        let step = if large {
            self.config.nudge_step_large
        } else {
            self.config.nudge_step
        };
        let delta = direction.unit() * step;
        self.move_by(id, delta.x, delta.y)
    }

    /// Where a drag by `(dx, dy)` would land after alignment snapping.
    ///
    /// Nothing is mutated; the result carries the snap offset and guides.
    pub fn preview_move(&self, id: FrameId, dx: f64, dy: f64) -> EditResult<(Rect, AlignmentResult)> {
        let frame = self.unlocked(id)?;
        let proposed = frame.bounds() + Vec2::new(dx, dy);
        let alignment = snap::align(&self.project, Some(id), proposed, self.config.snap_tolerance);
        Ok((alignment.snapped_rect(proposed), alignment))
    }

    /// Drag by `(dx, dy)` and snap to nearby frames.
    pub fn move_snapped(&mut self, id: FrameId, dx: f64, dy: f64) -> EditResult<AlignmentResult> {
        let (_, alignment) = self.preview_move(id, dx, dy)?;
        let offset = alignment.offset();
        self.move_by(id, dx + offset.x, dy + offset.y)?;
        Ok(alignment)
    }

    /// Resize through `handle` to `new_size`.
    ///
    /// Extents below the configured minimum are clamped; axes the handle
    /// does not act on are left alone.
    pub fn resize(
        &mut self,
        id: FrameId,
        handle: Handle,
        new_size: Size,
        anchor: ResizeAnchor,
    ) -> EditResult<()> {
        let frame = self.unlocked(id)?;
        let anchor_finite = match anchor {
            ResizeAnchor::Point(p) => p.is_finite(),
            _ => true,
        };
        if !new_size.is_finite() || !anchor_finite {
            return Err(GeometryRejected::NonFinite.into());
        }
        let clamped = Size::new(self.clamp_extent(new_size.width), self.clamp_extent(new_size.height));
        let (origin, size) = resize_geometry(frame.origin(), frame.size(), handle, clamped, anchor);
        self.set_geometry(id, origin, size)
    }

    /// Grow (positive `step`) or shrink both extents around `pointer`.
    pub fn scale_at(&mut self, id: FrameId, pointer: Point, step: f64) -> EditResult<()> {
        let frame = self.unlocked(id)?;
        let new_size = Size::new(frame.width() + step, frame.height() + step);
        self.resize(
            id,
            Handle::Corner(Corner::BottomRight),
            new_size,
            ResizeAnchor::Point(pointer),
        )
    }

    /// Set width or height exactly, keeping the top-left corner.
    ///
    /// Unlike [`resize`](Self::resize), a negative value is refused.
    pub fn set_extent(&mut self, id: FrameId, axis: Axis, value: f64) -> EditResult<()> {
        let frame = self.unlocked(id)?;
        if !value.is_finite() {
            return Err(GeometryRejected::NonFinite.into());
        }
        if value < 0.0 {
            return Err(GeometryRejected::InvalidExtent.into());
        }
        let value = self.clamp_extent(value);
        let mut size = frame.size();
        match axis {
            Axis::X => size.width = value,
            Axis::Y => size.height = value,
        }
        let origin = frame.origin();
        self.set_geometry(id, origin, size)
    }

    /// Copy a frame next to itself.
    ///
    /// The copy gets a fresh id, `"<name> copy"`, the same style and extent,
    /// an offset position, and sits right above the source in both the layer
    /// list and the paint order. Locked frames can be duplicated.
    pub fn duplicate(&mut self, id: FrameId) -> EditResult<FrameId> {
        let source = self.frame(id)?.clone();
        let offset = self.config.duplicate_offset;

        let mut copy = Frame::with_geometry(
            source.layer_id(),
            Point::new(source.x() + offset, source.y() + offset),
            source.size(),
        );
        copy.radius = source.radius();
        copy.color = source.color().clone();
        copy.name = format!("{} copy", source.name());
        copy.locked = source.is_locked();
        copy.visible = source.is_visible();
        copy.filled = source.is_filled();
        copy.z_order = source.z_order() + 1;
        let copy_id = copy.id();

        for frame in self.project.frames.values_mut() {
            if frame.z_order > source.z_order() {
                frame.z_order += 1;
            }
        }
        self.project.frames.insert(copy_id, copy);
        if let Some(layer) = self.project.layer_mut(source.layer_id()) {
            layer.insert_member_after(id, copy_id);
        }

        self.commit(vec![
            EditEvent::FrameAdded {
                id: copy_id,
                layer: source.layer_id(),
            },
            EditEvent::OrderChanged,
        ]);
        Ok(copy_id)
    }

    fn set_style(&mut self, id: FrameId, apply: impl FnOnce(&mut Frame)) -> EditResult<()> {
        let frame = self.project.frame_mut(id).ok_or(EditError::UnknownFrame(id))?;
        apply(frame);
        self.commit(vec![EditEvent::StyleChanged { id }]);
        Ok(())
    }

    pub fn rename(&mut self, id: FrameId, name: impl Into<String>) -> EditResult<()> {
        let name = name.into();
        self.set_style(id, |f| f.name = name)
    }

    pub fn set_color(&mut self, id: FrameId, color: FrameColor) -> EditResult<()> {
        self.set_style(id, |f| f.color = color)
    }

    /// Lock or unlock the geometry. Allowed while locked.
    pub fn set_locked(&mut self, id: FrameId, locked: bool) -> EditResult<()> {
        self.set_style(id, |f| f.locked = locked)
    }

    pub fn set_visible(&mut self, id: FrameId, visible: bool) -> EditResult<()> {
        self.set_style(id, |f| f.visible = visible)
    }

    pub fn set_filled(&mut self, id: FrameId, filled: bool) -> EditResult<()> {
        self.set_style(id, |f| f.filled = filled)
    }

    /// Set one corner radius, clamped to half the shorter side.
    pub fn set_radius(&mut self, id: FrameId, corner: Corner, value: f64) -> EditResult<()> {
        let mut radii = self.frame(id)?.radius();
        radii.set(corner, value);
        self.set_radii(id, radii)
    }

    /// Set all four radii, each clamped to half the shorter side.
    pub fn set_radii(&mut self, id: FrameId, radii: CornerRadii) -> EditResult<()> {
        let frame = self.unlocked(id)?;
        if radii.values().iter().any(|v| !v.is_finite()) {
            return Err(GeometryRejected::NonFinite.into());
        }
        let before = frame.radius();
        let after = radii.clamped_to(frame.width(), frame.height());
        if let Some(frame) = self.project.frame_mut(id) {
            frame.radius = after;
        }
        self.commit(vec![EditEvent::RadiusChanged { id, before, after }]);
        Ok(())
    }

    /// Remove a frame. Clears the selection if it was active.
    pub fn delete(&mut self, id: FrameId) -> EditResult<()> {
        let was_active = self.project.active_frame_id == Some(id);
        let frame = self.project.remove_frame(id).ok_or(EditError::UnknownFrame(id))?;
        self.project.normalize_z_order();

        let mut events = vec![EditEvent::FrameRemoved {
            id,
            layer: frame.layer_id(),
        }];
        if was_active {
            events.push(EditEvent::SelectionChanged {
                previous: Some(id),
                current: None,
            });
        }
        log::debug!("Deleted frame {id}");
        self.commit(events);
        Ok(())
    }

    /// Change the paint order. Z-orders end up as `0..n`.
    pub fn reorder(&mut self, id: FrameId, to: ZMove) -> EditResult<()> {
        self.frame(id)?;
        let mut order: Vec<FrameId> = self.project.frames_ordered().iter().map(|f| f.id()).collect();
        let Some(pos) = order.iter().position(|&f| f == id) else {
            return Err(EditError::UnknownFrame(id));
        };
        let last = order.len() - 1;
        match to {
            ZMove::Front => {
                order.remove(pos);
                order.push(id);
            }
            ZMove::Back => {
                order.remove(pos);
                order.insert(0, id);
            }
            ZMove::Forward if pos < last => order.swap(pos, pos + 1),
            ZMove::Backward if pos > 0 => order.swap(pos, pos - 1),
            ZMove::Forward | ZMove::Backward => {}
        }

        for (z, frame_id) in order.into_iter().enumerate() {
            if let Some(frame) = self.project.frame_mut(frame_id) {
                frame.z_order = z as i64;
            }
        }
        self.commit(vec![EditEvent::OrderChanged]);
        Ok(())
    }

    /// Move a frame into another layer (appended to its list).
    pub fn move_to_layer(&mut self, id: FrameId, layer: LayerId) -> EditResult<()> {
        let from = self.frame(id)?.layer_id();
        if self.project.layer(layer).is_none() {
            return Err(EditError::UnknownLayer(layer));
        }
        if from == layer {
            return Ok(());
        }
        if let Some(old) = self.project.layer_mut(from) {
            old.remove_member(id);
        }
        if let Some(new) = self.project.layer_mut(layer) {
            new.push_member(id);
        }
        if let Some(frame) = self.project.frame_mut(id) {
            frame.layer_id = layer;
        }
        self.commit(vec![
            EditEvent::LayerChanged { id: from },
            EditEvent::LayerChanged { id: layer },
        ]);
        Ok(())
    }

    /// Change the active frame.
    ///
    /// Selection is view state: it is saved with the project but does not
    /// count as an unsaved change.
    pub fn select(&mut self, id: Option<FrameId>) -> EditResult<()> {
        if let Some(id) = id {
            self.frame(id)?;
        }
        let previous = self.project.active_frame_id;
        if previous == id {
            return Ok(());
        }
        self.project.active_frame_id = id;
        self.events.emit(EditEvent::SelectionChanged {
            previous,
            current: id,
        });
        Ok(())
    }
}
