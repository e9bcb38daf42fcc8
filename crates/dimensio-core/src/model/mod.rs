//! Geometry model: frames, layers and the project that owns them.

mod color;
mod frame;
mod layer;
mod project;
pub mod validate;

pub use color::{FrameColor, PALETTE};
pub use frame::{Corner, CornerRadii, Frame};
pub use layer::Layer;
pub use project::{APP_VERSION, Project};
pub use validate::{Rule, Subject, ValidationReport, Violation};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for frames.
pub type FrameId = Uuid;

/// Unique identifier for layers.
pub type LayerId = Uuid;

/// A screen axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Horizontal: x, left/right, width.
    X,
    /// Vertical: y, top/bottom, height.
    Y,
}
