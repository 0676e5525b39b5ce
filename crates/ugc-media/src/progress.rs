//! Render progress tracking over FFmpeg's `-progress` stream.

use serde::{Deserialize, Serialize};

/// Lifecycle of one render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderState {
    NotStarted,
    Running,
    Completed,
    Failed,
}

impl RenderState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RenderState::Completed | RenderState::Failed)
    }
}

/// Event stream of a spawned render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RenderEvent {
    /// Fraction of the timeline rendered, in `[0, 1]`
    Progress { fraction: f64 },
    Completed,
    Failed { message: String },
}

/// Turns `key=value` progress lines into a non-decreasing fraction.
///
/// Only `out_time_us` and the `progress=end` sentinel are read. Values are
/// clamped to `[0, 1]` and never go backwards.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total_us: f64,
    state: RenderState,
    last: Option<f64>,
}

impl ProgressTracker {
    pub fn new(total_duration_secs: f64) -> Self {
        Self {
            total_us: total_duration_secs * 1_000_000.0,
            state: RenderState::NotStarted,
            last: None,
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Last delivered fraction.
    pub fn last_progress(&self) -> Option<f64> {
        self.last
    }

    pub fn start(&mut self) {
        if self.state == RenderState::NotStarted {
            self.state = RenderState::Running;
        }
    }

    /// Feed one stream line. Returns the fraction to deliver, if the line carries one.
    pub fn observe_line(&mut self, line: &str) -> Option<f64> {
        if self.state.is_terminal() {
            return None;
        }

        let (key, value) = line.trim().split_once('=')?;
        let fraction = match key.trim() {
            "out_time_us" => {
                let us = value.trim().parse::<i64>().ok()?;
                if self.total_us > 0.0 {
                    (us as f64 / self.total_us).clamp(0.0, 1.0)
                } else {
                    0.0
                }
            }
            "progress" if value.trim() == "end" => 1.0,
            _ => return None,
        };

        let fraction = self.last.map_or(fraction, |last| fraction.max(last));
        self.last = Some(fraction);
        Some(fraction)
    }

    /// Mark success. Returns a final `1.0` if the stream never reported one.
    pub fn complete(&mut self) -> Option<f64> {
        self.state = RenderState::Completed;
        if self.last == Some(1.0) {
            None
        } else {
            self.last = Some(1.0);
            Some(1.0)
        }
    }

    pub fn fail(&mut self) {
        self.state = RenderState::Failed;
    }
}
