//! Shared data models for the UGC video composer.
//!
//! This crate provides Serde-serializable types for:
//! - Scripts, segments and screencast placements
//! - Compiled timelines
//! - Composition modes and overlay positions
//! - Composition, output, audio, music and subtitle configuration

pub mod config;
pub mod mode;
pub mod script;
pub mod timeline;

// Re-export common types
pub use config::{
    AudioConfig, ComposeConfig, CompositionConfig, ConfigLoadError, GreenscreenConfig,
    MusicConfig, OutputConfig, OverlayConfig, PathsConfig, PipConfig, SplitConfig,
    SubtitleConfig,
};
pub use mode::{
    AvatarSide, AvatarSideParseError, CompositionMode, ModeParseError, Position,
    PositionParseError,
};
pub use script::{ScreencastOverlay, Script, Segment};
pub use timeline::{EntryKind, Timeline, TimelineEntry};

// Config range checks are exposed through the validator trait.
pub use validator::{Validate, ValidationErrors};
