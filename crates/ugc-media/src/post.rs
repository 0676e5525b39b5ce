//! Subtitle burn-in and background music, spliced onto a finished graph.
//!
//! Both rewrites only touch the canonical outputs: the current `[vout]` or
//! `[aout]` is renamed to an intermediate label and a new stage produces the
//! canonical label again.

use std::path::Path;
use ugc_models::MusicConfig;

use crate::error::MediaResult;
use crate::graph::{FilterGraph, Pad, Stage, AUDIO_OUT, VIDEO_OUT};

const VIDEO_PRE: &str = "vout_pre";
const AUDIO_PRE: &str = "aout_pre";

/// Apply optional subtitle and music stages.
///
/// With no subtitle file and no music the graph is returned untouched.
pub fn wrap_with_post_processing(
    mut graph: FilterGraph,
    subtitle_file: Option<&Path>,
    music_index: Option<usize>,
    music_config: Option<&MusicConfig>,
    total_duration: f64,
) -> MediaResult<FilterGraph> {
    if let Some(subtitles) = subtitle_file {
        graph.rename_output(VIDEO_OUT, VIDEO_PRE)?;
        graph.push(
            Stage::new()
                .input(Pad::label(VIDEO_PRE))
                .filter(format!("ass='{}'", escape_filter_path(subtitles)))
                .output(VIDEO_OUT),
        );
    }

    if let (Some(index), Some(music)) = (music_index, music_config) {
        graph.rename_output(AUDIO_OUT, AUDIO_PRE)?;
        append_music(&mut graph, index, music, total_duration);
    }

    Ok(graph)
}

fn append_music(graph: &mut FilterGraph, index: usize, music: &MusicConfig, total_duration: f64) {
    let mut looped = Stage::new().input(Pad::audio(index));
    if music.loop_track {
        looped = looped.filter("aloop=loop=-1:size=2e+09");
    }
    graph.push(
        looped
            .filter(format!("atrim=0:{:.2}", total_duration))
            .filter("asetpts=PTS-STARTPTS")
            .output("music_loop"),
    );

    let fade_start = (total_duration - music.fade_out_duration).max(0.0);
    graph.push(
        Stage::new()
            .input(Pad::label("music_loop"))
            .filter(format!(
                "afade=t=out:st={:.2}:d={:.2}",
                fade_start, music.fade_out_duration
            ))
            .output("music_faded"),
    );

    graph.push(
        Stage::new()
            .input(Pad::label(AUDIO_PRE))
            .input(Pad::label("music_faded"))
            .filter(format!(
                "amix=inputs=2:duration=first:weights=1 {:.2}",
                music.volume
            ))
            .output(AUDIO_OUT),
    );
}

/// Escape a path for use inside a quoted filter argument.
pub fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "\\\\")
        .replace(':', "\\:")
}
