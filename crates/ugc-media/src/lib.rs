#![deny(unreachable_patterns)]
//! Timeline-to-FFmpeg compiler for UGC videos.
//!
//! This crate provides:
//! - Clip probing through `ffprobe`
//! - Script-to-timeline compilation with clamped screencast windows
//! - Render-wide composition mode detection
//! - Typed filter graphs and one builder per composition mode
//! - Subtitle and music post-processing
//! - Command assembly, progress parsing from `-progress pipe:1`, timeout and
//!   cancellation via tokio

pub mod command;
pub mod compose;
pub mod error;
pub mod graph;
pub mod mode;
pub mod post;
pub mod probe;
pub mod progress;
pub mod runner;
pub mod timeline;

pub use command::{check_ffmpeg, FfmpegCommand, RenderCommand};
pub use compose::{
    assemble_render, compose_video, compose_video_with_progress, plan_render, ComposeInputs,
    ComposeOutcome, RenderPlan,
};
pub use error::{MediaError, MediaResult};
pub use graph::{FilterGraph, GraphBuilder, GraphBuilderRegistry, GraphRequest, Pad, Stage};
pub use mode::detect_mode;
pub use post::wrap_with_post_processing;
pub use probe::{check_ffprobe, FfprobeProbe, MediaProbe, PROBE_TIMEOUT_SECS};
pub use progress::{ProgressTracker, RenderEvent, RenderState};
pub use runner::{RenderHandle, RenderRunner, RENDER_TIMEOUT_SECS};
pub use timeline::{build_timeline, build_timeline_with_mode, validate_timeline_files};
