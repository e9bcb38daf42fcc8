//! Tunable engine constants.

use crate::snap::DEFAULT_SNAP_TOLERANCE;
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Engine settings. Every field falls back to its default when missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Alignment snap tolerance in reference pixels.
    pub snap_tolerance: f64,
    /// Offset applied on both axes by duplicate and create.
    pub duplicate_offset: f64,
    /// Smallest width/height a resize may produce.
    pub min_extent: f64,
    pub nudge_step: f64,
    pub nudge_step_large: f64,
    /// Extent change per mouse wheel notch.
    pub wheel_step: f64,
    pub default_width: f64,
    pub default_height: f64,
    pub default_origin: Point,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            snap_tolerance: DEFAULT_SNAP_TOLERANCE,
            duplicate_offset: 20.0,
            min_extent: 0.0,
            nudge_step: 1.0,
            nudge_step_large: 10.0,
            wheel_step: 10.0,
            default_width: 400.0,
            default_height: 250.0,
            default_origin: Point::new(100.0, 100.0),
        }
    }
}

impl EngineConfig {
    /// `<config_dir>/dimensio/config.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir()
            .or_else(dirs::home_dir)
            .map(|base| base.join("dimensio").join("config.json"))
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(json) => {
                let config = Self::from_json(&json)?;
                log::debug!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load from [`default_path`](Self::default_path), or the defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Default extent of a new frame.
    pub fn default_size(&self) -> Size {
        Size::new(self.default_width, self.default_height)
    }

    /// Replace out-of-range values with their defaults.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let non_negative = |v: f64, fallback: f64| if v.is_finite() && v >= 0.0 { v } else { fallback };
        let origin = if self.default_origin.is_finite() {
            self.default_origin
        } else {
            defaults.default_origin
        };
        Self {
            snap_tolerance: non_negative(self.snap_tolerance, defaults.snap_tolerance),
            duplicate_offset: if self.duplicate_offset.is_finite() && self.duplicate_offset > 0.0 {
                self.duplicate_offset
            } else {
                defaults.duplicate_offset
            },
            min_extent: non_negative(self.min_extent, defaults.min_extent),
            nudge_step: non_negative(self.nudge_step, defaults.nudge_step),
            nudge_step_large: non_negative(self.nudge_step_large, defaults.nudge_step_large),
            wheel_step: non_negative(self.wheel_step, defaults.wheel_step),
            default_width: non_negative(self.default_width, defaults.default_width),
            default_height: non_negative(self.default_height, defaults.default_height),
            default_origin: origin,
        }
    }
}
