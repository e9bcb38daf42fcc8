//! Current (`formatVersion: 3`) document layout and its mapping to the model.

use super::migrate::{self, FORMAT_VERSION};
use super::{PersistError, PersistResult};
use crate::model::{CornerRadii, Frame, FrameColor, FrameId, Layer, LayerId, Project};
use kurbo::{Point, Size};
use serde::de::{IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

fn yes() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectDoc {
    format_version: u32,
    #[serde(default)]
    app_version: String,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    layers: Vec<LayerDoc>,
    /// Keyed by frame id; sorted so output is deterministic.
    #[serde(default)]
    frames: BTreeMap<FrameId, FrameDoc>,
    #[serde(default)]
    active_frame_id: Option<FrameId>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayerDoc {
    id: LayerId,
    name: String,
    color: FrameColor,
    #[serde(default)]
    frame_ids: Vec<FrameId>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrameDoc {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    #[serde(default)]
    radius: CornerRadii,
    color: FrameColor,
    name: String,
    #[serde(default)]
    locked: bool,
    #[serde(default = "yes")]
    visible: bool,
    #[serde(default = "yes")]
    filled: bool,
    #[serde(default)]
    z_order: i64,
    layer_id: LayerId,
}

/// The first key under `frames` that occurs more than once.
///
/// A JSON object keeps only the last of duplicate keys, so this is checked
/// on the raw bytes before they are turned into a [`serde_json::Value`].
#[derive(Default)]
struct RepeatedKey(Option<String>);

impl<'de> Deserialize<'de> for RepeatedKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl<'de> Visitor<'de> for KeyVisitor {
            type Value = RepeatedKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map or list of frames")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RepeatedKey, A::Error> {
                let mut seen = HashSet::new();
                let mut repeated = None;
                while let Some(key) = map.next_key::<String>()? {
                    map.next_value::<IgnoredAny>()?;
                    if repeated.is_none() && !seen.insert(key.clone()) {
                        repeated = Some(key);
                    }
                }
                Ok(RepeatedKey(repeated))
            }

            // Legacy documents keep frames in a list; ids are fixed up there.
            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<RepeatedKey, A::Error> {
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(RepeatedKey(None))
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

#[derive(Deserialize)]
struct FrameKeys {
    #[serde(default)]
    frames: RepeatedKey,
}

fn repeated_frame_id(bytes: &[u8]) -> Option<String> {
    serde_json::from_slice::<FrameKeys>(bytes)
        .ok()
        .and_then(|keys| keys.frames.0)
}

impl From<&Project> for ProjectDoc {
    fn from(project: &Project) -> Self {
        let layers = project
            .layers()
            .iter()
            .map(|l| LayerDoc {
                id: l.id(),
                name: l.name().to_string(),
                color: l.color().clone(),
                frame_ids: l.frame_ids().to_vec(),
            })
            .collect();
        let frames = project
            .frames()
            .map(|f| {
                (
                    f.id(),
                    FrameDoc {
                        x: f.x(),
                        y: f.y(),
                        width: f.width(),
                        height: f.height(),
                        radius: f.radius(),
                        color: f.color().clone(),
                        name: f.name().to_string(),
                        locked: f.is_locked(),
                        visible: f.is_visible(),
                        filled: f.is_filled(),
                        z_order: f.z_order(),
                        layer_id: f.layer_id(),
                    },
                )
            })
            .collect();
        Self {
            format_version: FORMAT_VERSION,
            app_version: project.app_version().to_string(),
            created_at: project.created_at().to_string(),
            layers,
            frames,
            active_frame_id: project.active_frame_id(),
        }
    }
}

impl From<ProjectDoc> for Project {
    fn from(doc: ProjectDoc) -> Self {
        let frames: HashMap<FrameId, Frame> = doc
            .frames
            .into_iter()
            .map(|(id, f)| {
                let frame = Frame::reconstruct(
                    id,
                    Point::new(f.x, f.y),
                    Size::new(f.width, f.height),
                    f.radius,
                    f.color,
                    f.name,
                    f.locked,
                    f.visible,
                    f.filled,
                    f.z_order,
                    f.layer_id,
                );
                (id, frame)
            })
            .collect();
        let layers = doc
            .layers
            .into_iter()
            .map(|l| Layer::reconstruct(l.id, l.name, l.color, l.frame_ids))
            .collect();
        Project {
            format_version: FORMAT_VERSION,
            app_version: doc.app_version,
            created_at: doc.created_at,
            frames,
            layers,
            active_frame_id: doc.active_frame_id,
        }
    }
}

/// Serialize a project to pretty-printed JSON bytes.
///
/// The output is deterministic: layers keep display order and frames are
/// sorted by id.
pub fn serialize(project: &Project) -> PersistResult<Vec<u8>> {
    let doc = ProjectDoc::from(project);
    let bytes = serde_json::to_vec_pretty(&doc)?;
    log::debug!(
        "Serialized project ({} frames, {} bytes)",
        project.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Decode a document of any supported version into a validated project.
pub fn deserialize(bytes: &[u8]) -> PersistResult<Project> {
    deserialize_versioned(bytes).map(|(project, _)| project)
}

/// Like [`deserialize`], also returning the version the document was written in.
pub(crate) fn deserialize_versioned(bytes: &[u8]) -> PersistResult<(Project, u32)> {
    let mut value: serde_json::Value = serde_json::from_slice(bytes)?;
    if let Some(id) = repeated_frame_id(bytes) {
        log::warn!("Rejected project with frame {id} stored twice");
        return Err(PersistError::schema(format!("frame id {id} appears more than once")));
    }
    let from = migrate::migrate(&mut value)?;
    let doc: ProjectDoc = serde_json::from_value(value)?;
    let project = Project::from(doc);
    project.validate().into_result().map_err(PersistError::Invalid)?;
    Ok((project, from))
}
