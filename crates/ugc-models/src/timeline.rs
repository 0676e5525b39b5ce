//! Compiled, absolute-time timeline.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::mode::CompositionMode;

/// Kind of clip a timeline entry places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Avatar,
    Screencast,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Avatar => "avatar",
            EntryKind::Screencast => "screencast",
        }
    }
}

/// One clip placement in absolute seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimelineEntry {
    pub start: f64,
    pub end: f64,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub file: PathBuf,
    /// Segment id; for screencasts this links back to the hosting avatar entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_segment: Option<u32>,
    #[serde(default)]
    pub composition_mode: CompositionMode,
}

impl TimelineEntry {
    pub fn avatar(start: f64, end: f64, file: impl Into<PathBuf>, segment: u32) -> Self {
        Self {
            start,
            end,
            kind: EntryKind::Avatar,
            file: file.into(),
            parent_segment: Some(segment),
            composition_mode: CompositionMode::Overlay,
        }
    }

    pub fn screencast(
        start: f64,
        end: f64,
        file: impl Into<PathBuf>,
        segment: u32,
        mode: CompositionMode,
    ) -> Self {
        Self {
            start,
            end,
            kind: EntryKind::Screencast,
            file: file.into(),
            parent_segment: Some(segment),
            composition_mode: mode,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_avatar(&self) -> bool {
        self.kind == EntryKind::Avatar
    }

    pub fn is_screencast(&self) -> bool {
        self.kind == EntryKind::Screencast
    }
}

/// Full composition timeline. Built once per render, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Timeline {
    pub script_id: String,
    pub total_duration: f64,
    #[serde(default)]
    pub entries: Vec<TimelineEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

impl Timeline {
    pub fn new(script_id: impl Into<String>, total_duration: f64, entries: Vec<TimelineEntry>) -> Self {
        Self {
            script_id: script_id.into(),
            total_duration,
            entries,
            output_path: None,
        }
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Avatar entries in timeline order.
    pub fn avatar_entries(&self) -> Vec<&TimelineEntry> {
        self.entries.iter().filter(|e| e.is_avatar()).collect()
    }

    /// Screencast entries in timeline order.
    pub fn screencast_entries(&self) -> Vec<&TimelineEntry> {
        self.entries.iter().filter(|e| e.is_screencast()).collect()
    }

    /// Position of the avatar entry hosting `segment`, counted among avatars only.
    pub fn avatar_index_for_segment(&self, segment: Option<u32>) -> Option<usize> {
        let segment = segment?;
        self.entries
            .iter()
            .filter(|e| e.is_avatar())
            .position(|e| e.parent_segment == Some(segment))
    }

    /// Human-readable listing of the timeline.
    pub fn describe(&self) -> String {
        let rule = "━".repeat(50);
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Timeline for {} (total: {:.1}s):",
            self.script_id, self.total_duration
        );
        let _ = writeln!(out, "{}", rule);

        for entry in &self.entries {
            let indent = if entry.is_avatar() { "  " } else { "  └─ " };
            let name = entry
                .file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| entry.file.display().to_string());
            let _ = writeln!(
                out,
                "{:5.1}s - {:5.1}s │ {}{}: {}",
                entry.start,
                entry.end,
                indent,
                entry.kind.as_str(),
                name
            );
        }

        out.push_str(&rule);
        if let Some(ref output) = self.output_path {
            let _ = write!(out, "\nOutput: {}", output.display());
        }
        out
    }
}
