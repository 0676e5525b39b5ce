//! Greenscreen: the presenter, background removed, stands in front of the
//! screencast.

use tracing::debug;
use ugc_models::CompositionMode;

use super::{finalize, start_graph, Layout};
use crate::error::MediaResult;
use crate::graph::registry::{GraphBuilder, GraphRequest};
use crate::graph::{enable_between, FilterGraph, Pad, Stage};

/// Each screencast becomes a full-frame background during its window. When a
/// transparent avatar for the hosting segment is available it is layered on
/// top at the configured scale and corner.
#[derive(Debug, Clone, Default)]
pub struct GreenscreenBuilder;

impl GreenscreenBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl GraphBuilder for GreenscreenBuilder {
    fn mode(&self) -> CompositionMode {
        CompositionMode::Greenscreen
    }

    fn build(&self, request: &GraphRequest<'_>) -> MediaResult<FilterGraph> {
        let layout = Layout::prepare(request)?;
        let (mut graph, mut current) = start_graph(request, &layout);
        let gs = &request.config.composition.greenscreen;
        let avatar_w = (layout.width as f64 * gs.avatar_scale) as u32;

        for (i, entry) in layout.screencasts.iter().enumerate() {
            let enable = enable_between(entry.start, entry.end);

            let background = format!("bg{}", i);
            graph.push(layout.fill_frame(Pad::video(layout.screencast_input(i)), background.clone()));

            let composited = format!("sc_base{}", i);
            graph.push(
                Stage::new()
                    .input(Pad::label(current))
                    .input(Pad::label(background))
                    .filter(format!("overlay=0:0:{}", enable))
                    .output(composited.clone()),
            );
            current = composited;

            let transparent = request
                .timeline
                .avatar_index_for_segment(entry.parent_segment)
                .filter(|idx| *idx < request.auxiliary_clips.len());
            let Some(avatar_idx) = transparent else {
                debug!(screencast = i, "No transparent avatar for greenscreen window");
                continue;
            };

            let scaled = format!("ta{}", i);
            graph.push(
                Stage::new()
                    .input(Pad::video(layout.auxiliary_input(avatar_idx)))
                    .filter(format!("scale={}:-1", avatar_w))
                    .output(scaled.clone()),
            );

            let (x, y) = gs.avatar_position.overlay_coords(gs.avatar_margin, "w", "h");
            let output = format!("gs{}", i);
            graph.push(
                Stage::new()
                    .input(Pad::label(current))
                    .input(Pad::label(scaled))
                    .filter(format!("overlay=x={}:y={}:{}", x, y, enable))
                    .output(output.clone()),
            );
            current = output;
        }

        finalize(&mut graph, &current, request);
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use ugc_models::{ComposeConfig, Timeline, TimelineEntry};

    fn gs_timeline() -> Timeline {
        Timeline::new(
            "G1",
            8.0,
            vec![
                TimelineEntry::avatar(0.0, 8.0, "a.mp4", 1),
                TimelineEntry::screencast(1.0, 5.0, "s.mp4", 1, CompositionMode::Greenscreen),
            ],
        )
    }

    #[test]
    fn test_transparent_avatar_over_background() {
        let timeline = gs_timeline();
        let config = ComposeConfig::default();
        let transparent = vec![PathBuf::from("ta0.webm")];
        let request =
            GraphRequest::new(&timeline, &config, &[true]).with_auxiliary_clips(&transparent);
        let graph = GreenscreenBuilder::new().build(&request).unwrap();
        let text = graph.to_string();

        assert!(text.contains("[1:v]scale=1080:1920,setsar=1[bg0]"));
        assert!(text.contains("[base][bg0]overlay=0:0:enable='between(t,1.00,5.00)'[sc_base0]"));
        assert!(text.contains("[2:v]scale=864:-1[ta0]"));
        assert!(text.contains(
            "[sc_base0][ta0]overlay=x=W-w-30:y=H-h-30:enable='between(t,1.00,5.00)'[gs0]"
        ));
        assert!(text.contains("[gs0]null[vout]"));
        graph.validate().unwrap();
    }

    #[test]
    fn test_without_transparent_avatar_background_only() {
        let timeline = gs_timeline();
        let config = ComposeConfig::default();
        let text = GreenscreenBuilder::new()
            .build(&GraphRequest::new(&timeline, &config, &[true]))
            .unwrap()
            .to_string();

        assert!(text.contains("[sc_base0]null[vout]"));
        assert!(!text.contains("[ta0]"));
    }
}
