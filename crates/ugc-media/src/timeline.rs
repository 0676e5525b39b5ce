//! Script-to-timeline compilation.
//!
//! Avatar clips are laid end to end in segment order. Each segment's
//! screencasts are shifted to absolute time and clamped to the hosting
//! avatar's window, so every screencast lies inside its parent clip.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use ugc_models::{CompositionMode, Script, Timeline, TimelineEntry};

use crate::error::{MediaError, MediaResult};
use crate::probe::MediaProbe;

/// Build a timeline using the modes tagged on each screencast.
pub async fn build_timeline(
    script: &Script,
    avatar_clips: &[PathBuf],
    screencasts_dir: &Path,
    output_path: &Path,
    probe: &dyn MediaProbe,
) -> MediaResult<Timeline> {
    build_timeline_with_mode(script, avatar_clips, screencasts_dir, output_path, probe, None).await
}

/// Build a timeline, optionally forcing one composition mode on every screencast.
///
/// `Overlay` as an override means "use the per-screencast tags". The script is
/// never modified.
pub async fn build_timeline_with_mode(
    script: &Script,
    avatar_clips: &[PathBuf],
    screencasts_dir: &Path,
    output_path: &Path,
    probe: &dyn MediaProbe,
    mode_override: Option<CompositionMode>,
) -> MediaResult<Timeline> {
    if avatar_clips.is_empty() {
        return Err(MediaError::configuration("no avatar clips supplied"));
    }

    let forced_mode = mode_override.filter(|m| *m != CompositionMode::Overlay);

    if avatar_clips.len() < script.segments.len() {
        warn!(
            script_id = %script.script_id,
            segments = script.segments.len(),
            clips = avatar_clips.len(),
            "Fewer avatar clips than segments, trailing segments dropped"
        );
    }

    let mut entries = Vec::new();
    let mut cursor = 0.0_f64;

    for (segment, clip) in script.segments.iter().zip(avatar_clips) {
        let duration = probe.duration(clip).await?;
        let seg_start = cursor;
        let seg_end = cursor + duration;

        entries.push(TimelineEntry::avatar(seg_start, seg_end, clip.clone(), segment.id));

        for overlay in &segment.screencasts {
            if overlay.is_unresolved() {
                warn!(
                    segment = segment.id,
                    file = %overlay.file,
                    "Screencast keyword timing was never resolved, skipping"
                );
                continue;
            }

            let sc_path = screencasts_dir.join(&overlay.file);
            if !sc_path.exists() {
                warn!(path = %sc_path.display(), "Screencast file not found, skipping");
                continue;
            }

            let start = (seg_start + overlay.start.max(0.0)).min(seg_end);
            let end = (seg_start + overlay.end).min(seg_end);
            if end <= start {
                warn!(
                    segment = segment.id,
                    file = %overlay.file,
                    start,
                    end,
                    "Screencast window is empty after clamping to its avatar clip, skipping"
                );
                continue;
            }

            let mode = forced_mode.unwrap_or(overlay.mode);
            entries.push(TimelineEntry::screencast(start, end, sc_path, segment.id, mode));
        }

        cursor = seg_end;
    }

    debug!(
        script_id = %script.script_id,
        entries = entries.len(),
        total_duration = cursor,
        "Timeline built"
    );

    Ok(Timeline::new(script.script_id.clone(), cursor, entries).with_output_path(output_path))
}

/// Fail with every entry file that does not exist on disk.
pub fn validate_timeline_files(timeline: &Timeline) -> MediaResult<()> {
    let missing: Vec<PathBuf> = timeline
        .entries
        .iter()
        .filter(|e| !e.file.exists())
        .map(|e| e.file.clone())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(MediaError::MissingFiles(missing))
    }
}
