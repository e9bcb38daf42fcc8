//! Project: the root aggregate that owns every frame and layer.

use super::validate::{self, ValidationReport};
use super::{Frame, FrameId, Layer, LayerId};
use crate::persist::FORMAT_VERSION;
use kurbo::{Point, Rect};
use std::collections::HashMap;

/// Version string of the producing application.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The in-memory workspace: layers, frames and selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub(crate) format_version: u32,
    pub(crate) app_version: String,
    pub(crate) created_at: String,
    /// All frames, keyed by ID.
    pub(crate) frames: HashMap<FrameId, Frame>,
    /// Layers in display order.
    pub(crate) layers: Vec<Layer>,
    pub(crate) active_frame_id: Option<FrameId>,
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl Project {
    /// Create a new empty project.
    pub fn new() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            app_version: APP_VERSION.to_string(),
            created_at: String::new(),
            frames: HashMap::new(),
            layers: Vec::new(),
            active_frame_id: None,
        }
    }

    pub fn format_version(&self) -> u32 {
        self.format_version
    }

    /// Version of the application that produced this project.
    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    /// Creation timestamp carried over from legacy files (may be empty).
    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    /// Get a frame by ID.
    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(&id)
    }

    pub(crate) fn frame_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        self.frames.get_mut(&id)
    }

    /// All frames in unspecified order.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.values()
    }

    /// Frames back to front (ascending z-order, ties by id).
    pub fn frames_ordered(&self) -> Vec<&Frame> {
        let mut frames: Vec<&Frame> = self.frames.values().collect();
        frames.sort_by_key(|f| (f.z_order, f.id));
        frames
    }

    /// Layers in display order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub(crate) fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    /// The layer that owns `frame`.
    pub fn layer_of(&self, frame: FrameId) -> Option<&Layer> {
        self.frame(frame).and_then(|f| self.layer(f.layer_id))
    }

    pub fn active_frame_id(&self) -> Option<FrameId> {
        self.active_frame_id
    }

    pub fn active_frame(&self) -> Option<&Frame> {
        self.active_frame_id.and_then(|id| self.frame(id))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Get the bounding box of all frames.
    pub fn bounds(&self) -> Option<Rect> {
        self.frames
            .values()
            .map(Frame::bounds)
            .reduce(|acc, bounds| acc.union(bounds))
    }

    /// Visible frames under `point`, front to back (selection priority).
    pub fn frames_at_point(&self, point: Point) -> Vec<FrameId> {
        self.frames_ordered()
            .into_iter()
            .rev()
            .filter(|f| f.visible && f.hit_test(point))
            .map(|f| f.id)
            .collect()
    }

    pub fn max_z_order(&self) -> Option<i64> {
        self.frames.values().map(|f| f.z_order).max()
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> ValidationReport {
        validate::validate(self)
    }

    pub(crate) fn insert_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    /// Add a frame and register it with its layer.
    ///
    /// The caller guarantees that the layer exists.
    pub(crate) fn insert_frame(&mut self, frame: Frame) {
        let id = frame.id;
        if let Some(layer) = self.layer_mut(frame.layer_id) {
            layer.push_member(id);
        }
        self.frames.insert(id, frame);
    }

    /// Remove a frame, its layer membership and, if needed, the selection.
    pub(crate) fn remove_frame(&mut self, id: FrameId) -> Option<Frame> {
        let frame = self.frames.remove(&id)?;
        if let Some(layer) = self.layer_mut(frame.layer_id) {
            layer.remove_member(id);
        }
        if self.active_frame_id == Some(id) {
            self.active_frame_id = None;
        }
        Some(frame)
    }

    /// Reassign z-orders to `0..n`, keeping the current relative order.
    pub(crate) fn normalize_z_order(&mut self) {
        let order: Vec<FrameId> = self.frames_ordered().iter().map(|f| f.id).collect();
        for (z, id) in order.into_iter().enumerate() {
            if let Some(frame) = self.frames.get_mut(&id) {
                frame.z_order = z as i64;
            }
        }
    }
}
