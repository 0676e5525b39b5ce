//! Per-mode graph builders.
//!
//! Input numbering is fixed across modes: avatars first, then screencasts,
//! then the mode's auxiliary clips. Every builder starts from the same
//! concatenated `[base]` video and narration, and ends with the same
//! finalization.

use ugc_models::{OverlayConfig, TimelineEntry};

use super::audio::{append_loudness, append_narration};
use super::registry::GraphRequest;
use super::{enable_between, FilterGraph, Pad, Stage, BASE_VIDEO, VIDEO_OUT};
use crate::error::{MediaError, MediaResult};

mod greenscreen;
mod overlay;
mod pip;
mod split;

pub use greenscreen::GreenscreenBuilder;
pub use overlay::OverlayBuilder;
pub use pip::PipBuilder;
pub use split::SplitBuilder;

/// Checked view over a [`GraphRequest`].
pub(crate) struct Layout<'a> {
    pub avatars: Vec<&'a TimelineEntry>,
    pub screencasts: Vec<&'a TimelineEntry>,
    pub width: u32,
    pub height: u32,
}

impl<'a> Layout<'a> {
    pub fn prepare(request: &GraphRequest<'a>) -> MediaResult<Self> {
        let avatars = request.timeline.avatar_entries();
        if avatars.is_empty() {
            return Err(MediaError::configuration("timeline has no avatar entries"));
        }
        if request.audio_presence.len() != avatars.len() {
            return Err(MediaError::configuration(format!(
                "audio_presence has {} entries but the timeline has {} avatar clips",
                request.audio_presence.len(),
                avatars.len()
            )));
        }

        Ok(Self {
            avatars,
            screencasts: request.timeline.screencast_entries(),
            width: request.config.output.width(),
            height: request.config.output.height(),
        })
    }

    /// Input index of screencast `i`.
    pub fn screencast_input(&self, i: usize) -> usize {
        self.avatars.len() + i
    }

    /// Input index of auxiliary clip `i`.
    pub fn auxiliary_input(&self, i: usize) -> usize {
        self.avatars.len() + self.screencasts.len() + i
    }

    /// Scale a video input to fill the output frame.
    pub fn fill_frame(&self, pad: Pad, label: impl Into<String>) -> Stage {
        Stage::new()
            .input(pad)
            .filter(format!("scale={}:{}", self.width, self.height))
            .filter("setsar=1")
            .output(label)
    }

    /// Scale screencast input `input` to the configured width and layer it in
    /// a corner of `current` while `entry` is active.
    pub fn corner_overlay(
        &self,
        overlay: &OverlayConfig,
        entry: &TimelineEntry,
        input: usize,
        scaled_label: &str,
        current: &str,
        output: &str,
    ) -> [Stage; 2] {
        let scaled_width = (self.width as f64 * overlay.scale) as u32;
        let (x, y) = overlay.position.overlay_coords(overlay.margin, "w", "h");
        [
            Stage::new()
                .input(Pad::video(input))
                .filter(format!("scale={}:-1", scaled_width))
                .output(scaled_label),
            Stage::new()
                .input(Pad::label(current))
                .input(Pad::label(scaled_label))
                .filter(format!(
                    "overlay=x={}:y={}:{}",
                    x,
                    y,
                    enable_between(entry.start, entry.end)
                ))
                .output(output),
        ]
    }
}

/// Scale every avatar to the output size and join them into `[base]`.
pub(crate) fn append_base_video(graph: &mut FilterGraph, layout: &Layout<'_>) {
    for i in 0..layout.avatars.len() {
        graph.push(layout.fill_frame(Pad::video(i), format!("av{}", i)));
    }

    if layout.avatars.len() == 1 {
        graph.push(
            Stage::new()
                .input(Pad::label("av0"))
                .filter("copy")
                .output(BASE_VIDEO),
        );
    } else {
        let stage = (0..layout.avatars.len())
            .fold(Stage::new(), |stage, i| stage.input(Pad::label(format!("av{}", i))))
            .filter(format!("concat=n={}:v=1:a=0", layout.avatars.len()))
            .output(BASE_VIDEO);
        graph.push(stage);
    }
}

/// Base video plus narration. Returns the graph and the current video label.
pub(crate) fn start_graph(request: &GraphRequest<'_>, layout: &Layout<'_>) -> (FilterGraph, String) {
    let mut graph = FilterGraph::new();
    append_base_video(&mut graph, layout);
    append_narration(
        &mut graph,
        &layout.avatars,
        request.audio_presence,
        request.timeline.total_duration,
    );
    (graph, BASE_VIDEO.to_string())
}

/// Rename the current video to `[vout]` and finish the audio as `[aout]`.
pub(crate) fn finalize(graph: &mut FilterGraph, current: &str, request: &GraphRequest<'_>) {
    graph.push(
        Stage::new()
            .input(Pad::label(current))
            .filter("null")
            .output(VIDEO_OUT),
    );
    append_loudness(graph, &request.config.audio);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ugc_models::{ComposeConfig, Timeline};

    #[test]
    fn test_single_avatar_is_copied_not_concatenated() {
        let timeline = Timeline::new("B1", 8.0, vec![TimelineEntry::avatar(0.0, 8.0, "a.mp4", 1)]);
        let config = ComposeConfig::default();
        let request = GraphRequest::new(&timeline, &config, &[true]);
        let layout = Layout::prepare(&request).unwrap();

        let mut graph = FilterGraph::new();
        append_base_video(&mut graph, &layout);
        assert_eq!(
            graph.to_string(),
            "[0:v]scale=1080:1920,setsar=1[av0];[av0]copy[base]"
        );
    }

    #[test]
    fn test_input_numbering() {
        let timeline = Timeline::new(
            "B2",
            16.0,
            vec![
                TimelineEntry::avatar(0.0, 8.0, "a.mp4", 1),
                TimelineEntry::screencast(1.0, 2.0, "s.mp4", 1, Default::default()),
                TimelineEntry::avatar(8.0, 16.0, "b.mp4", 2),
            ],
        );
        let config = ComposeConfig::default();
        let presence = [true, true];
        let request = GraphRequest::new(&timeline, &config, &presence);
        let layout = Layout::prepare(&request).unwrap();

        assert_eq!(layout.screencast_input(0), 2);
        assert_eq!(layout.auxiliary_input(0), 3);
        assert_eq!(layout.auxiliary_input(1), 4);
    }

    #[test]
    fn test_no_avatars_is_configuration_error() {
        let timeline = Timeline::new("B3", 0.0, Vec::new());
        let config = ComposeConfig::default();
        let request = GraphRequest::new(&timeline, &config, &[]);
        assert!(Layout::prepare(&request).err().unwrap().is_configuration());
    }
}
