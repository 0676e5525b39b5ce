//! Timeline rendering: probe, compile, assemble, run.

use std::path::{Path, PathBuf};
use tracing::{debug, info};
use ugc_models::{ComposeConfig, CompositionMode, Timeline, Validate};

use crate::command::{FfmpegCommand, RenderCommand};
use crate::error::{MediaError, MediaResult};
use crate::graph::{FilterGraph, GraphBuilderRegistry, GraphRequest, AUDIO_OUT, VIDEO_OUT};
use crate::mode::detect_mode;
use crate::post::wrap_with_post_processing;
use crate::probe::MediaProbe;
use crate::runner::RenderRunner;
use crate::timeline::validate_timeline_files;

/// Optional artifacts supplied by collaborators next to the timeline.
#[derive(Debug, Clone, Default)]
pub struct ComposeInputs {
    /// Head cutouts aligned by avatar index, used in pip renders
    pub head_videos: Vec<PathBuf>,
    /// Background-removed avatars aligned by avatar index, used in greenscreen renders
    pub transparent_avatars: Vec<PathBuf>,
    pub subtitle_file: Option<PathBuf>,
    /// Explicit music track; wins over the configured one
    pub music_file: Option<PathBuf>,
}

impl ComposeInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_head_videos(mut self, paths: Vec<PathBuf>) -> Self {
        self.head_videos = paths;
        self
    }

    pub fn with_transparent_avatars(mut self, paths: Vec<PathBuf>) -> Self {
        self.transparent_avatars = paths;
        self
    }

    pub fn with_subtitles(mut self, path: impl Into<PathBuf>) -> Self {
        self.subtitle_file = Some(path.into());
        self
    }

    pub fn with_music(mut self, path: impl Into<PathBuf>) -> Self {
        self.music_file = Some(path.into());
        self
    }

    /// Auxiliary clips the given mode consumes.
    pub fn auxiliary_clips(&self, mode: CompositionMode) -> &[PathBuf] {
        match mode {
            CompositionMode::Pip => &self.head_videos,
            CompositionMode::Greenscreen => &self.transparent_avatars,
            CompositionMode::Overlay | CompositionMode::Split => &[],
        }
    }
}

/// Everything decided before the renderer starts.
#[derive(Debug, Clone)]
pub struct RenderPlan {
    pub mode: CompositionMode,
    pub graph: FilterGraph,
    pub audio_presence: Vec<bool>,
    pub total_duration: f64,
    ffmpeg: FfmpegCommand,
}

impl RenderPlan {
    /// The renderer invocation, without progress reporting.
    pub fn command(&self) -> RenderCommand {
        self.ffmpeg.to_render_command()
    }

    /// The renderer invocation with `-progress pipe:1 -nostats`.
    pub fn progress_command(&self) -> RenderCommand {
        self.ffmpeg.clone().with_progress(true).to_render_command()
    }

    pub fn output_path(&self) -> &Path {
        self.ffmpeg.output_path()
    }
}

/// Result of [`compose_video`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeOutcome {
    /// Command that would have run
    DryRun(RenderCommand),
    /// Rendered output file
    Rendered(PathBuf),
}

/// Compile a timeline into a render plan from known audio presence.
///
/// Pure: no files are touched and no processes are spawned.
pub fn assemble_render(
    timeline: &Timeline,
    config: &ComposeConfig,
    inputs: &ComposeInputs,
    audio_presence: Vec<bool>,
    registry: &GraphBuilderRegistry,
) -> MediaResult<RenderPlan> {
    let output = timeline
        .output_path
        .as_deref()
        .ok_or_else(|| MediaError::configuration("timeline has no output path"))?;

    config
        .validate()
        .map_err(|e| MediaError::configuration(format!("invalid config: {}", e)))?;

    let mode = detect_mode(timeline);
    let auxiliary = inputs.auxiliary_clips(mode);
    let request = GraphRequest::new(timeline, config, &audio_presence).with_auxiliary_clips(auxiliary);
    let graph = registry.build(mode, &request)?;

    let avatars = timeline.avatar_entries();
    let screencasts = timeline.screencast_entries();
    let mut ffmpeg = FfmpegCommand::new(output)
        .inputs(avatars.iter().map(|e| &e.file))
        .inputs(screencasts.iter().map(|e| &e.file))
        .inputs(auxiliary);

    let music_file = config.music.effective_file(inputs.music_file.as_deref());
    let music_index = music_file.as_ref().map(|_| ffmpeg.input_count());
    if let Some(ref path) = music_file {
        ffmpeg = ffmpeg.input(path);
    }

    let graph = wrap_with_post_processing(
        graph,
        inputs.subtitle_file.as_deref(),
        music_index,
        music_index.map(|_| &config.music),
        timeline.total_duration,
    )?;
    graph.validate()?;

    let ffmpeg = ffmpeg
        .filter_complex(graph.to_string())
        .map(VIDEO_OUT)
        .map(AUDIO_OUT)
        .output_args(config.output.to_ffmpeg_args())
        .output_args(config.audio.to_ffmpeg_args())
        .faststart();

    debug!(
        mode = %mode,
        stages = graph.len(),
        inputs = ffmpeg.input_count(),
        "Render plan assembled"
    );

    Ok(RenderPlan {
        mode,
        graph,
        audio_presence,
        total_duration: timeline.total_duration,
        ffmpeg,
    })
}

/// Check files, probe audio presence and compile the render plan.
pub async fn plan_render(
    timeline: &Timeline,
    config: &ComposeConfig,
    inputs: &ComposeInputs,
    probe: &dyn MediaProbe,
) -> MediaResult<RenderPlan> {
    if timeline.output_path.is_none() {
        return Err(MediaError::configuration("timeline has no output path"));
    }
    validate_timeline_files(timeline)?;

    let mut audio_presence = Vec::new();
    for entry in timeline.avatar_entries() {
        audio_presence.push(probe.has_audio(&entry.file).await?);
    }

    assemble_render(
        timeline,
        config,
        inputs,
        audio_presence,
        &GraphBuilderRegistry::new(),
    )
}

/// Render a timeline, or only describe the command when `dry_run` is set.
pub async fn compose_video(
    timeline: &Timeline,
    config: &ComposeConfig,
    inputs: &ComposeInputs,
    probe: &dyn MediaProbe,
    runner: &RenderRunner,
    dry_run: bool,
) -> MediaResult<ComposeOutcome> {
    let plan = plan_render(timeline, config, inputs, probe).await?;

    if dry_run {
        return Ok(ComposeOutcome::DryRun(plan.command()));
    }

    let command = plan.command();
    command.ensure_output_dir()?;
    info!(mode = %plan.mode, output = %plan.output_path().display(), "Rendering");
    runner.run(&command).await?;
    Ok(ComposeOutcome::Rendered(plan.output_path().to_path_buf()))
}

/// Render a timeline, delivering progress fractions to `sink`.
pub async fn compose_video_with_progress<F>(
    timeline: &Timeline,
    config: &ComposeConfig,
    inputs: &ComposeInputs,
    probe: &dyn MediaProbe,
    runner: &RenderRunner,
    sink: F,
) -> MediaResult<PathBuf>
where
    F: FnMut(f64) + Send,
{
    let plan = plan_render(timeline, config, inputs, probe).await?;
    let command = plan.progress_command();
    command.ensure_output_dir()?;

    info!(
        mode = %plan.mode,
        output = %plan.output_path().display(),
        duration = plan.total_duration,
        "Rendering with progress"
    );
    runner
        .run_with_progress(&command, plan.total_duration, sink)
        .await?;
    Ok(plan.output_path().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ugc_models::TimelineEntry;

    fn two_clip_timeline() -> Timeline {
        Timeline::new(
            "C1",
            16.0,
            vec![
                TimelineEntry::avatar(0.0, 8.0, "a.mp4", 1),
                TimelineEntry::screencast(2.0, 6.0, "s.mp4", 1, CompositionMode::Pip),
                TimelineEntry::avatar(8.0, 16.0, "b.mp4", 2),
            ],
        )
        .with_output_path("out/C1.mp4")
    }

    fn args_of(plan: &RenderPlan) -> Vec<String> {
        plan.command().args
    }

    #[test]
    fn test_input_order_with_auxiliaries_and_music() {
        let inputs = ComposeInputs::new()
            .with_head_videos(vec!["h0.mp4".into(), "h1.mp4".into()])
            .with_transparent_avatars(vec!["t0.webm".into()])
            .with_music("bed.mp3");
        let plan = assemble_render(
            &two_clip_timeline(),
            &ComposeConfig::default(),
            &inputs,
            vec![true, true],
            &GraphBuilderRegistry::new(),
        )
        .unwrap();

        assert_eq!(plan.mode, CompositionMode::Pip);
        let inputs: Vec<String> = args_of(&plan)
            .windows(2)
            .filter(|w| w[0] == "-i")
            .map(|w| w[1].clone())
            .collect();
        // transparent avatars are not used in pip renders
        assert_eq!(inputs, vec!["a.mp4", "b.mp4", "s.mp4", "h0.mp4", "h1.mp4", "bed.mp3"]);
        assert!(plan.graph.to_string().contains("[5:a]aloop"));
    }

    #[test]
    fn test_output_flags() {
        let plan = assemble_render(
            &two_clip_timeline(),
            &ComposeConfig::default(),
            &ComposeInputs::new(),
            vec![true, false],
            &GraphBuilderRegistry::new(),
        )
        .unwrap();
        let args = args_of(&plan);
        let tail: Vec<&str> = args
            .iter()
            .skip_while(|a| *a != "-map")
            .map(String::as_str)
            .collect();

        assert_eq!(
            tail,
            vec![
                "-map", "[vout]", "-map", "[aout]",
                "-c:v", "libx264", "-preset", "medium", "-crf", "23",
                "-pix_fmt", "yuv420p", "-r", "30",
                "-c:a", "aac", "-b:a", "192k",
                "-movflags", "+faststart", "-y", "out/C1.mp4",
            ]
        );
        assert!(!args.contains(&"-progress".to_string()));
        assert!(plan.progress_command().args.contains(&"-progress".to_string()));
    }

    #[test]
    fn test_missing_output_path() {
        let timeline = Timeline::new("C2", 8.0, vec![TimelineEntry::avatar(0.0, 8.0, "a.mp4", 1)]);
        let err = assemble_render(
            &timeline,
            &ComposeConfig::default(),
            &ComposeInputs::new(),
            vec![true],
            &GraphBuilderRegistry::new(),
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_invalid_config_is_configuration_error() {
        let mut config = ComposeConfig::default();
        config.composition.split.split_ratio = 0.95;
        let err = assemble_render(
            &two_clip_timeline(),
            &config,
            &ComposeInputs::new(),
            vec![true, true],
            &GraphBuilderRegistry::new(),
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_configured_music_only_when_enabled() {
        let mut config = ComposeConfig::default();
        config.music.file = Some("bed.mp3".into());
        let plan = assemble_render(
            &two_clip_timeline(),
            &config,
            &ComposeInputs::new(),
            vec![true, true],
            &GraphBuilderRegistry::new(),
        )
        .unwrap();
        assert!(!plan.graph.to_string().contains("amix"));

        config.music.enabled = true;
        let plan = assemble_render(
            &two_clip_timeline(),
            &config,
            &ComposeInputs::new(),
            vec![true, true],
            &GraphBuilderRegistry::new(),
        )
        .unwrap();
        assert!(plan.graph.to_string().contains("[3:a]aloop"));
    }
}
