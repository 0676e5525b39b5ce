//! Composition mode, overlay position and split side definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How screencasts are composited with the avatar.
///
/// Stored per timeline entry, but a render uses exactly one mode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum CompositionMode {
    /// Avatar as background, screencast in a corner
    #[default]
    Overlay,
    /// Screencast fullscreen, head cutout in a corner
    Pip,
    /// Avatar and screencast side by side
    Split,
    /// Screencast as background, background-removed avatar on top
    Greenscreen,
}

impl CompositionMode {
    /// All composition modes.
    pub const ALL: &'static [CompositionMode] = &[
        CompositionMode::Overlay,
        CompositionMode::Pip,
        CompositionMode::Split,
        CompositionMode::Greenscreen,
    ];

    /// Render-wide precedence, highest first. `Overlay` is the fallback.
    pub const PRECEDENCE: &'static [CompositionMode] = &[
        CompositionMode::Greenscreen,
        CompositionMode::Pip,
        CompositionMode::Split,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompositionMode::Overlay => "overlay",
            CompositionMode::Pip => "pip",
            CompositionMode::Split => "split",
            CompositionMode::Greenscreen => "greenscreen",
        }
    }

    /// Whether this mode can use per-avatar auxiliary clips
    /// (head cutouts for PiP, transparent avatars for green screen).
    pub fn uses_auxiliary_clips(&self) -> bool {
        matches!(self, CompositionMode::Pip | CompositionMode::Greenscreen)
    }
}

impl fmt::Display for CompositionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CompositionMode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "overlay" => Ok(CompositionMode::Overlay),
            "pip" => Ok(CompositionMode::Pip),
            "split" => Ok(CompositionMode::Split),
            "greenscreen" => Ok(CompositionMode::Greenscreen),
            _ => Err(ModeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown composition mode: {0}")]
pub struct ModeParseError(String);

/// Corner position for layered clips.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

impl Position {
    pub const ALL: &'static [Position] = &[
        Position::TopLeft,
        Position::TopRight,
        Position::BottomLeft,
        Position::BottomRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::TopLeft => "top-left",
            Position::TopRight => "top-right",
            Position::BottomLeft => "bottom-left",
            Position::BottomRight => "bottom-right",
        }
    }

    /// FFmpeg `overlay` coordinate expressions for this corner.
    ///
    /// `overlay_w`/`overlay_h` name the layered clip's size variables
    /// (`w`/`h` inside the overlay filter).
    pub fn overlay_coords(&self, margin: u32, overlay_w: &str, overlay_h: &str) -> (String, String) {
        match self {
            Position::TopLeft => (margin.to_string(), margin.to_string()),
            Position::TopRight => (format!("W-{}-{}", overlay_w, margin), margin.to_string()),
            Position::BottomLeft => (margin.to_string(), format!("H-{}-{}", overlay_h, margin)),
            Position::BottomRight => (
                format!("W-{}-{}", overlay_w, margin),
                format!("H-{}-{}", overlay_h, margin),
            ),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Position {
    type Err = PositionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "top-left" => Ok(Position::TopLeft),
            "top-right" => Ok(Position::TopRight),
            "bottom-left" => Ok(Position::BottomLeft),
            "bottom-right" => Ok(Position::BottomRight),
            _ => Err(PositionParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown position: {0}")]
pub struct PositionParseError(String);

/// Which half of a split frame the avatar keeps.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum AvatarSide {
    #[default]
    Left,
    Right,
}

impl AvatarSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvatarSide::Left => "left",
            AvatarSide::Right => "right",
        }
    }
}

impl fmt::Display for AvatarSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AvatarSide {
    type Err = AvatarSideParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" => Ok(AvatarSide::Left),
            "right" => Ok(AvatarSide::Right),
            _ => Err(AvatarSideParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown avatar side: {0}")]
pub struct AvatarSideParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_round_trip_names() {
        for mode in CompositionMode::ALL {
            assert_eq!(mode.as_str().parse::<CompositionMode>().unwrap(), *mode);
        }
        assert!("mosaic".parse::<CompositionMode>().is_err());
    }

    #[test]
    fn test_mode_serde_names() {
        let json = serde_json::to_string(&CompositionMode::Greenscreen).unwrap();
        assert_eq!(json, "\"greenscreen\"");
        let mode: CompositionMode = serde_json::from_str("\"pip\"").unwrap();
        assert_eq!(mode, CompositionMode::Pip);
    }

    #[test]
    fn test_auxiliary_modes() {
        assert!(CompositionMode::Pip.uses_auxiliary_clips());
        assert!(CompositionMode::Greenscreen.uses_auxiliary_clips());
        assert!(!CompositionMode::Split.uses_auxiliary_clips());
        assert!(!CompositionMode::Overlay.uses_auxiliary_clips());
    }

    #[test]
    fn test_overlay_coords() {
        assert_eq!(
            Position::BottomRight.overlay_coords(50, "w", "h"),
            ("W-w-50".to_string(), "H-h-50".to_string())
        );
        assert_eq!(
            Position::TopLeft.overlay_coords(30, "w", "h"),
            ("30".to_string(), "30".to_string())
        );
        assert_eq!(
            Position::TopRight.overlay_coords(10, "w", "h"),
            ("W-w-10".to_string(), "10".to_string())
        );
        assert_eq!(
            Position::BottomLeft.overlay_coords(20, "overlay_w", "overlay_h"),
            ("20".to_string(), "H-overlay_h-20".to_string())
        );
    }

    #[test]
    fn test_position_from_str() {
        assert_eq!("bottom-right".parse::<Position>().unwrap(), Position::BottomRight);
        assert_eq!("TOP-LEFT".parse::<Position>().unwrap(), Position::TopLeft);
        assert!("middle".parse::<Position>().is_err());
        let pos: Position = serde_json::from_str("\"top-right\"").unwrap();
        assert_eq!(pos, Position::TopRight);
    }

    #[test]
    fn test_avatar_side() {
        assert_eq!("right".parse::<AvatarSide>().unwrap(), AvatarSide::Right);
        assert_eq!(AvatarSide::default(), AvatarSide::Left);
    }
}
