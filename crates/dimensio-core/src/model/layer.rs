//! Layer: a named, colored grouping of frames.

use super::{FrameColor, FrameId, LayerId};
use uuid::Uuid;

/// A display-ordered group of frames.
///
/// The layer only refers to its members by id; the frames themselves are
/// owned by the [`Project`](super::Project).
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub(crate) id: LayerId,
    pub(crate) name: String,
    pub(crate) color: FrameColor,
    pub(crate) frame_ids: Vec<FrameId>,
}

impl Layer {
    /// Create an empty layer.
    pub fn new(name: impl Into<String>, color: FrameColor) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color,
            frame_ids: Vec::new(),
        }
    }

    /// Reconstruct a layer with a specific ID (for storage).
    pub(crate) fn reconstruct(
        id: LayerId,
        name: String,
        color: FrameColor,
        frame_ids: Vec<FrameId>,
    ) -> Self {
        Self {
            id,
            name,
            color,
            frame_ids,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> &FrameColor {
        &self.color
    }

    /// Member frame ids in list order.
    pub fn frame_ids(&self) -> &[FrameId] {
        &self.frame_ids
    }

    pub fn contains(&self, frame: FrameId) -> bool {
        self.frame_ids.contains(&frame)
    }

    pub fn is_empty(&self) -> bool {
        self.frame_ids.is_empty()
    }

    pub(crate) fn push_member(&mut self, frame: FrameId) {
        self.frame_ids.push(frame);
    }

    /// Insert `frame` right after `anchor`, or at the end if `anchor` is absent.
    pub(crate) fn insert_member_after(&mut self, anchor: FrameId, frame: FrameId) {
        match self.frame_ids.iter().position(|&id| id == anchor) {
            Some(pos) => self.frame_ids.insert(pos + 1, frame),
            None => self.frame_ids.push(frame),
        }
    }

    /// Remove `frame` from the membership list. Returns true if it was present.
    pub(crate) fn remove_member(&mut self, frame: FrameId) -> bool {
        let before = self.frame_ids.len();
        self.frame_ids.retain(|&id| id != frame);
        self.frame_ids.len() != before
    }
}
