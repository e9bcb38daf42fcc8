//! Change notifications for renderers and panels.

use crate::model::{CornerRadii, FrameId, LayerId};
use kurbo::Rect;
use std::sync::mpsc::{self, Receiver, Sender};

/// A change applied by the [`Session`](super::Session).
#[derive(Debug, Clone, PartialEq)]
pub enum EditEvent {
    FrameAdded {
        id: FrameId,
        layer: LayerId,
    },
    FrameRemoved {
        id: FrameId,
        layer: LayerId,
    },
    /// Position or extent changed.
    GeometryChanged {
        id: FrameId,
        before: Rect,
        after: Rect,
    },
    RadiusChanged {
        id: FrameId,
        before: CornerRadii,
        after: CornerRadii,
    },
    /// Name, color, lock, visibility or fill changed.
    StyleChanged {
        id: FrameId,
    },
    /// Paint order changed.
    OrderChanged,
    SelectionChanged {
        previous: Option<FrameId>,
        current: Option<FrameId>,
    },
    /// A layer was added, removed, renamed or its membership changed.
    LayerChanged {
        id: LayerId,
    },
    /// The whole project was swapped (new or open).
    ProjectReplaced,
}

/// Fan-out of events to any number of subscribers.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<EditEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    pub fn subscribe(&mut self) -> Receiver<EditEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver `event` to every live subscriber; dropped receivers are pruned.
    pub fn emit(&mut self, event: EditEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
