//! Side-by-side split: avatar on one side, screencast on the other.

use ugc_models::{AvatarSide, CompositionMode};

use super::{finalize, start_graph, Layout};
use crate::error::MediaResult;
use crate::graph::registry::{GraphBuilder, GraphRequest};
use crate::graph::{enable_between, FilterGraph, Pad, Stage};

/// For each screencast window the current frame is branched: one branch is
/// cropped to the avatar's share of the width, the screencast is scaled into
/// the remainder, and the stacked result covers the frame while active.
#[derive(Debug, Clone, Default)]
pub struct SplitBuilder;

impl SplitBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl GraphBuilder for SplitBuilder {
    fn mode(&self) -> CompositionMode {
        CompositionMode::Split
    }

    fn build(&self, request: &GraphRequest<'_>) -> MediaResult<FilterGraph> {
        let layout = Layout::prepare(request)?;
        let (mut graph, mut current) = start_graph(request, &layout);
        let split = &request.config.composition.split;

        let (w, h) = (layout.width, layout.height);
        let avatar_w = (w as f64 * split.split_ratio) as u32;
        let screencast_w = w - avatar_w;
        let avatar_x = match split.avatar_side {
            AvatarSide::Left => 0,
            AvatarSide::Right => w - avatar_w,
        };

        for (i, entry) in layout.screencasts.iter().enumerate() {
            let crop_branch = format!("sp_crop{}", i);
            let keep_branch = format!("sp_keep{}", i);
            graph.push(
                Stage::new()
                    .input(Pad::label(current))
                    .filter("split=2")
                    .output(crop_branch.clone())
                    .output(keep_branch.clone()),
            );

            let avatar_half = format!("sp_avatar{}", i);
            let screencast_half = format!("sp_screen{}", i);
            graph.push(
                Stage::new()
                    .input(Pad::label(crop_branch))
                    .filter(format!("crop={}:{}:{}:0", avatar_w, h, avatar_x))
                    .output(avatar_half.clone()),
            );
            graph.push(
                Stage::new()
                    .input(Pad::video(layout.screencast_input(i)))
                    .filter(format!("scale={}:{}", screencast_w, h))
                    .filter("setsar=1")
                    .output(screencast_half.clone()),
            );

            let (left, right) = match split.avatar_side {
                AvatarSide::Left => (avatar_half, screencast_half),
                AvatarSide::Right => (screencast_half, avatar_half),
            };
            let stacked = format!("hs{}", i);
            graph.push(
                Stage::new()
                    .input(Pad::label(left))
                    .input(Pad::label(right))
                    .filter("hstack=inputs=2")
                    .output(stacked.clone()),
            );

            let output = format!("split{}", i);
            graph.push(
                Stage::new()
                    .input(Pad::label(keep_branch))
                    .input(Pad::label(stacked))
                    .filter(format!("overlay=0:0:{}", enable_between(entry.start, entry.end)))
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
    use ugc_models::{ComposeConfig, Timeline, TimelineEntry};

    fn split_timeline() -> Timeline {
        Timeline::new(
            "S1",
            8.0,
            vec![
                TimelineEntry::avatar(0.0, 8.0, "a.mp4", 1),
                TimelineEntry::screencast(2.0, 6.0, "s.mp4", 1, CompositionMode::Split),
            ],
        )
    }

    #[test]
    fn test_avatar_on_right() {
        let timeline = split_timeline();
        let mut config = ComposeConfig::default();
        config.composition.split.avatar_side = AvatarSide::Right;
        config.composition.split.split_ratio = 0.5;
        let graph = SplitBuilder::new()
            .build(&GraphRequest::new(&timeline, &config, &[true]))
            .unwrap();
        let text = graph.to_string();

        assert!(text.contains("[base]split=2[sp_crop0][sp_keep0]"));
        assert!(text.contains("[sp_crop0]crop=540:1920:540:0[sp_avatar0]"));
        assert!(text.contains("[1:v]scale=540:1920,setsar=1[sp_screen0]"));
        assert!(text.contains("[sp_screen0][sp_avatar0]hstack=inputs=2[hs0]"));
        assert!(text.contains("[sp_keep0][hs0]overlay=0:0:enable='between(t,2.00,6.00)'[split0]"));
        graph.validate().unwrap();
    }

    #[test]
    fn test_avatar_on_left_with_uneven_ratio() {
        let timeline = split_timeline();
        let mut config = ComposeConfig::default();
        config.composition.split.split_ratio = 0.6;
        let text = SplitBuilder::new()
            .build(&GraphRequest::new(&timeline, &config, &[true]))
            .unwrap()
            .to_string();

        assert!(text.contains("crop=648:1920:0:0[sp_avatar0]"));
        assert!(text.contains("scale=432:1920,setsar=1[sp_screen0]"));
        assert!(text.contains("[sp_avatar0][sp_screen0]hstack=inputs=2"));
    }
}
