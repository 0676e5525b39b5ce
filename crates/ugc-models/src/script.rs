//! Script, segment and screencast placement models.
//!
//! Scripts are produced by an external parser. The compiler only reads them;
//! timing fields on [`ScreencastOverlay`] may be rewritten by the sync step
//! before a timeline is built.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::mode::CompositionMode;

/// A screencast placed inside a segment.
///
/// `start`/`end` are relative to the hosting segment's start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScreencastOverlay {
    /// File name inside the screencasts directory
    pub file: String,
    /// Start time in seconds, relative to the segment
    pub start: f64,
    /// End time in seconds, relative to the segment
    pub end: f64,
    #[serde(default)]
    pub mode: CompositionMode,
    /// Spoken keyword that marks the start, resolved by the sync step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_keyword: Option<String>,
    /// Spoken keyword that marks the end, resolved by the sync step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_keyword: Option<String>,
}

impl ScreencastOverlay {
    /// Create a placement with numeric timing.
    pub fn new(file: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            file: file.into(),
            start,
            end,
            mode: CompositionMode::Overlay,
            start_keyword: None,
            end_keyword: None,
        }
    }

    /// Create a keyword placement. Timing stays `0..0` until synced.
    pub fn keyword(
        file: impl Into<String>,
        start_keyword: impl Into<String>,
        end_keyword: Option<String>,
    ) -> Self {
        Self {
            file: file.into(),
            start: 0.0,
            end: 0.0,
            mode: CompositionMode::Overlay,
            start_keyword: Some(start_keyword.into()),
            end_keyword,
        }
    }

    pub fn with_mode(mut self, mode: CompositionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Keyword placement whose timing has not been resolved yet.
    pub fn is_unresolved(&self) -> bool {
        self.start_keyword.is_some() && self.start == 0.0 && self.end == 0.0
    }
}

/// One narrated unit of the script, hosted by one avatar clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    pub id: u32,
    pub text: String,
    /// Expected duration in seconds (advisory; the probed clip length wins)
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_clip: Option<PathBuf>,
    #[serde(default)]
    pub screencasts: Vec<ScreencastOverlay>,
}

impl Segment {
    pub fn new(id: u32, text: impl Into<String>, duration: f64) -> Self {
        Self {
            id,
            text: text.into(),
            duration,
            avatar_clip: None,
            screencasts: Vec::new(),
        }
    }

    pub fn with_screencast(mut self, overlay: ScreencastOverlay) -> Self {
        self.screencasts.push(overlay);
        self
    }
}

/// A parsed script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Script {
    pub script_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
    #[serde(default)]
    pub total_duration: f64,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl Script {
    pub fn new(script_id: impl Into<String>, title: impl Into<String>, segments: Vec<Segment>) -> Self {
        let total_duration = segments.iter().map(|s| s.duration).sum();
        Self {
            script_id: script_id.into(),
            title: title.into(),
            character: None,
            total_duration,
            segments,
        }
    }
}
