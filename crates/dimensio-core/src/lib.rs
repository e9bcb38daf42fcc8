//! Dimensio Core Library
//!
//! Platform-agnostic frame model, editing, alignment, gap measurement and
//! project files for the Dimensio measuring overlay.

pub mod config;
pub mod edit;
pub mod measure;
pub mod model;
pub mod persist;
pub mod snap;
pub mod workspace;

pub use config::{ConfigError, EngineConfig};
pub use edit::{Direction, EditError, EditEvent, EditResult, GeometryRejected, Handle, Session, ZMove};
pub use measure::{Gap, Measurement, gap, gap_between, measure, measure_to_point};
pub use model::{Axis, Corner, CornerRadii, Frame, FrameColor, FrameId, Layer, LayerId, Project};
pub use persist::{FORMAT_VERSION, PersistError, PersistResult, SaveState, SaveWorker};
pub use snap::{AlignmentResult, DEFAULT_SNAP_TOLERANCE, Guide, align, align_edges};
pub use workspace::{Workspace, WorkspaceError};
