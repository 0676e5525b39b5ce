//! Narration audio shared by every composition mode.

use ugc_models::config::{AUDIO_SAMPLE_RATE, LOUDNORM_RANGE, LOUDNORM_TRUE_PEAK};
use ugc_models::{AudioConfig, TimelineEntry};

use super::{FilterGraph, Pad, Stage, AUDIO_OUT, BASE_AUDIO};

fn silence(duration: f64) -> [String; 3] {
    [
        format!("anullsrc=r={}:cl=stereo", AUDIO_SAMPLE_RATE),
        format!("atrim=0:{:.2}", duration),
        "asetpts=PTS-STARTPTS".to_string(),
    ]
}

/// Append one continuous narration track labelled `[audio]`.
///
/// Clips with audio are resampled and rebased to zero; silent clips get
/// generated silence of their own length. Avatar `i` is input `i`, so
/// `avatars` and `audio_presence` must be aligned.
pub fn append_narration(
    graph: &mut FilterGraph,
    avatars: &[&TimelineEntry],
    audio_presence: &[bool],
    total_duration: f64,
) {
    if avatars.is_empty() {
        let stage = silence(total_duration)
            .into_iter()
            .fold(Stage::new(), |stage, filter| stage.filter(filter));
        graph.push(stage.output(BASE_AUDIO));
        return;
    }

    for (i, (entry, has_audio)) in avatars.iter().zip(audio_presence).enumerate() {
        let stage = if *has_audio {
            Stage::new()
                .input(Pad::audio(i))
                .filter(format!("aresample={}", AUDIO_SAMPLE_RATE))
                .filter("asetpts=PTS-STARTPTS")
        } else {
            silence(entry.duration())
                .into_iter()
                .fold(Stage::new(), |stage, filter| stage.filter(filter))
        };
        graph.push(stage.output(format!("a{}", i)));
    }

    if avatars.len() == 1 {
        graph.push(
            Stage::new()
                .input(Pad::label("a0"))
                .filter("anull")
                .output(BASE_AUDIO),
        );
    } else {
        let stage = (0..avatars.len())
            .fold(Stage::new(), |stage, i| stage.input(Pad::label(format!("a{}", i))))
            .filter(format!("concat=n={}:v=0:a=1", avatars.len()))
            .output(BASE_AUDIO);
        graph.push(stage);
    }
}

/// Append the terminal `[audio] -> [aout]` stage.
pub fn append_loudness(graph: &mut FilterGraph, config: &AudioConfig) {
    let filter = if config.normalize {
        format!(
            "loudnorm=I={}:TP={}:LRA={}",
            config.target_loudness, LOUDNORM_TRUE_PEAK, LOUDNORM_RANGE
        )
    } else {
        "anull".to_string()
    };
    graph.push(
        Stage::new()
            .input(Pad::label(BASE_AUDIO))
            .filter(filter)
            .output(AUDIO_OUT),
    );
}
