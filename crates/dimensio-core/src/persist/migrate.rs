//! Version migration: upgrades older `.dio` JSON to the current layout.
//!
//! Each step is a pure function on the JSON object that moves the document
//! from version N to N+1. Steps run in order until the document reaches
//! [`FORMAT_VERSION`].
//!
//! - **v1**: legacy files: `"version": "1.0"` and a
//!   `frames` list of `{id, title, x, y, width, height, bg_color,
//!   border_color, radii, locked, visible, fill_enabled}`.
//! - **v2**: frames keyed by id with camelCase fields and a `zOrder`.
//! - **v3**: layers, `layerId` on every frame and `activeFrameId`.

use super::{PersistError, PersistResult};
use crate::edit::DEFAULT_LAYER_NAME;
use crate::model::{CornerRadii, FrameColor};
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use uuid::Uuid;

/// Current project format version.
pub const FORMAT_VERSION: u32 = 3;

type Object = Map<String, Value>;

/// Border color of a legacy frame that never stored one.
const LEGACY_BORDER_COLOR: &str = "#ffffff";

/// Work out which version a parsed document was written in.
///
/// Documents without any version marker but with a `frames` list are
/// treated as version 1.
pub fn detect_version(value: &Value) -> PersistResult<u32> {
    let obj = value
        .as_object()
        .ok_or_else(|| PersistError::schema("project root must be a JSON object"))?;

    if let Some(version) = obj.get("formatVersion") {
        let found = version
            .as_u64()
            .ok_or_else(|| PersistError::schema("formatVersion must be a positive integer"))?;
        if found > u64::from(FORMAT_VERSION) {
            return Err(PersistError::FutureVersion {
                found,
                supported: FORMAT_VERSION,
            });
        }
        if found < 2 {
            return Err(PersistError::schema(format!(
                "formatVersion {found} does not exist"
            )));
        }
        return Ok(found as u32);
    }

    if let Some(version) = obj.get("version") {
        let major = match version {
            Value::String(s) => s.split('.').next().and_then(|m| m.trim().parse::<u64>().ok()),
            Value::Number(n) => n.as_f64().map(|v| v.trunc() as u64),
            _ => None,
        };
        return match major {
            Some(1) => Ok(1),
            Some(found) if found > u64::from(FORMAT_VERSION) => Err(PersistError::FutureVersion {
                found,
                supported: FORMAT_VERSION,
            }),
            _ => Err(PersistError::schema(format!(
                "unsupported legacy version {version}"
            ))),
        };
    }

    if obj.get("frames").is_some_and(Value::is_array) {
        log::warn!("Project has no version field, assuming version 1");
        return Ok(1);
    }
    Err(PersistError::Unversioned)
}

/// Migrate a document to [`FORMAT_VERSION`] in place.
///
/// Returns the version the document started at. Migrating a current
/// document is a no-op.
pub fn migrate(value: &mut Value) -> PersistResult<u32> {
    let from = detect_version(value)?;
    if from == FORMAT_VERSION {
        log::debug!("Project is at current version, no migration needed");
        return Ok(from);
    }
    let Some(obj) = value.as_object_mut() else {
        return Err(PersistError::schema("project root must be a JSON object"));
    };

    let mut current = from;
    while current < FORMAT_VERSION {
        log::info!("Migrating project from version {} to {}", current, current + 1);
        match current {
            1 => v1_to_v2(obj)?,
            2 => v2_to_v3(obj)?,
            other => {
                return Err(PersistError::Migration {
                    from: other,
                    reason: format!("no migration path from version {other}"),
                });
            }
        }
        current += 1;
    }
    obj.insert("formatVersion".into(), Value::from(FORMAT_VERSION));
    log::info!("Project migration complete ({} -> {})", from, FORMAT_VERSION);
    Ok(from)
}

fn number(obj: &Object, key: &str, default: f64) -> f64 {
    obj.get(key).and_then(Value::as_f64).unwrap_or(default)
}

fn boolean(obj: &Object, key: &str, default: bool) -> bool {
    obj.get(key).and_then(Value::as_bool).unwrap_or(default)
}

fn string(obj: &Object, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Legacy `radii`: an object with `tl/tr/bl/br`, or a single number.
fn legacy_radii(value: Option<&Value>) -> CornerRadii {
    match value {
        Some(Value::Number(n)) => CornerRadii::uniform(n.as_f64().unwrap_or(0.0)),
        Some(Value::Object(r)) => CornerRadii {
            tl: number(r, "tl", 0.0),
            tr: number(r, "tr", 0.0),
            bl: number(r, "bl", 0.0),
            br: number(r, "br", 0.0),
        },
        _ => CornerRadii::ZERO,
    }
}

/// v1 -> v2: frames list to id-keyed map, legacy field names to camelCase.
pub(crate) fn v1_to_v2(obj: &mut Object) -> PersistResult<()> {
    let fail = |reason: String| PersistError::Migration { from: 1, reason };

    let frames = match obj.remove("frames") {
        None => Vec::new(),
        Some(Value::Array(frames)) => frames,
        Some(_) => return Err(fail("frames must be a list".into())),
    };

    let mut seen = HashSet::new();
    let mut migrated = Object::new();
    for (index, item) in frames.iter().enumerate() {
        let frame = item
            .as_object()
            .ok_or_else(|| fail(format!("frame {index} must be an object")))?;

        let id = frame
            .get("id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
            .filter(|id| !seen.contains(id))
            .unwrap_or_else(|| {
                log::warn!("Frame {index} has a missing or duplicate id, assigning a new one");
                Uuid::new_v4()
            });
        seen.insert(id);

        let width = number(frame, "width", 200.0);
        let height = number(frame, "height", 200.0);
        let radius = legacy_radii(frame.get("radii")).clamped_to(width, height);
        let color = string(frame, "border_color").unwrap_or_else(|| LEGACY_BORDER_COLOR.to_string());
        let name = string(frame, "title").unwrap_or_else(|| format!("Frame {}", index + 1));

        migrated.insert(
            id.to_string(),
            json!({
                "x": number(frame, "x", 100.0),
                "y": number(frame, "y", 100.0),
                "width": width,
                "height": height,
                "radius": radius,
                "color": color,
                "name": name,
                "locked": boolean(frame, "locked", false),
                "visible": boolean(frame, "visible", true),
                "filled": boolean(frame, "fill_enabled", true),
                "zOrder": index,
            }),
        );
    }

    let app_version = obj.remove("app_version").unwrap_or_else(|| Value::from(""));
    let created_at = obj.remove("created_at").unwrap_or_else(|| Value::from(""));
    obj.remove("version");
    obj.insert("formatVersion".into(), Value::from(2));
    obj.insert("appVersion".into(), app_version);
    obj.insert("createdAt".into(), created_at);
    obj.insert("frames".into(), Value::Object(migrated));
    Ok(())
}

/// v2 -> v3: put every frame into one default layer.
pub(crate) fn v2_to_v3(obj: &mut Object) -> PersistResult<()> {
    let fail = |reason: &str| PersistError::Migration {
        from: 2,
        reason: reason.to_string(),
    };

    if !obj.contains_key("frames") {
        obj.insert("frames".into(), Value::Object(Object::new()));
    }
    let frames = obj
        .get_mut("frames")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| fail("frames must be an object"))?;

    let mut order: Vec<(i64, String)> = frames
        .iter()
        .map(|(id, f)| (f.get("zOrder").and_then(Value::as_i64).unwrap_or(0), id.clone()))
        .collect();
    order.sort();

    let color = order
        .first()
        .and_then(|(_, id)| frames.get(id))
        .and_then(|f| f.get("color"))
        .and_then(Value::as_str)
        .map(FrameColor::new)
        .unwrap_or_default();

    let layer_id = Uuid::new_v4().to_string();
    for frame in frames.values_mut() {
        let frame = frame
            .as_object_mut()
            .ok_or_else(|| fail("every frame must be an object"))?;
        frame.insert("layerId".into(), Value::from(layer_id.clone()));
    }

    let frame_ids: Vec<Value> = order.into_iter().map(|(_, id)| Value::from(id)).collect();
    obj.insert(
        "layers".into(),
        json!([{
            "id": layer_id,
            "name": DEFAULT_LAYER_NAME,
            "color": color,
            "frameIds": frame_ids,
        }]),
    );
    obj.entry("activeFrameId").or_insert(Value::Null);
    obj.insert("formatVersion".into(), Value::from(3));
    Ok(())
}
