//! Frame and layer classification colors.

use serde::{Deserialize, Serialize};

/// Preset colors handed out to new frames, in order.
pub const PALETTE: [&str; 7] = [
    "#00b4ff", // Blue (default)
    "#2ecc71", // Green
    "#e74c3c", // Red
    "#9b59b6", // Purple
    "#f1c40f", // Yellow
    "#e67e22", // Orange
    "#1abc9c", // Teal
];

/// A classification color.
///
/// Usually a `#rrggbb` or `#rrggbbaa` hex string, but any tag string is
/// accepted so that files from other producers survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameColor(String);

impl FrameColor {
    /// Wrap an arbitrary color tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Build a hex color from RGBA8 components.
    ///
    /// Fully opaque colors are written without an alpha byte.
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        if a == u8::MAX {
            Self(format!("#{:02x}{:02x}{:02x}", r, g, b))
        } else {
            Self(format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a))
        }
    }

    /// Palette color for the `index`-th created frame (wraps around).
    pub fn palette(index: usize) -> Self {
        Self::new(PALETTE[index % PALETTE.len()])
    }

    /// The raw tag.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the tag as a hex color. Returns `None` for non-hex tags.
    pub fn to_rgba8(&self) -> Option<[u8; 4]> {
        let hex = self.0.strip_prefix('#')?;
        if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        let alpha = if hex.len() == 8 { channel(6)? } else { u8::MAX };
        Some([channel(0)?, channel(2)?, channel(4)?, alpha])
    }
}

impl Default for FrameColor {
    fn default() -> Self {
        Self::palette(0)
    }
}

impl From<&str> for FrameColor {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl std::fmt::Display for FrameColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
