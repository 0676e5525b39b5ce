//! Render-wide composition mode selection.

use ugc_models::{CompositionMode, Timeline};

/// Pick the single mode a timeline renders in.
///
/// Mixed timelines resolve to the highest-ranked tag present
/// (greenscreen, then pip, then split). Overlay is the fallback.
pub fn detect_mode(timeline: &Timeline) -> CompositionMode {
    let tagged: Vec<CompositionMode> = timeline
        .screencast_entries()
        .iter()
        .map(|e| e.composition_mode)
        .collect();

    CompositionMode::PRECEDENCE
        .iter()
        .copied()
        .find(|mode| tagged.contains(mode))
        .unwrap_or(CompositionMode::Overlay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ugc_models::TimelineEntry;

    fn timeline_with(modes: &[CompositionMode]) -> Timeline {
        let mut entries = vec![TimelineEntry::avatar(0.0, 10.0, "a.mp4", 1)];
        for (i, mode) in modes.iter().enumerate() {
            let start = i as f64;
            entries.push(TimelineEntry::screencast(start, start + 1.0, "s.mp4", 1, *mode));
        }
        Timeline::new("M1", 10.0, entries)
    }

    #[test]
    fn test_no_screencasts_is_overlay() {
        assert_eq!(detect_mode(&timeline_with(&[])), CompositionMode::Overlay);
    }

    #[test]
    fn test_overlay_only_is_overlay() {
        let tl = timeline_with(&[CompositionMode::Overlay, CompositionMode::Overlay]);
        assert_eq!(detect_mode(&tl), CompositionMode::Overlay);
    }

    #[test]
    fn test_precedence() {
        use CompositionMode::*;
        assert_eq!(detect_mode(&timeline_with(&[Pip, Greenscreen])), Greenscreen);
        assert_eq!(detect_mode(&timeline_with(&[Split, Pip])), Pip);
        assert_eq!(detect_mode(&timeline_with(&[Overlay, Split])), Split);
        assert_eq!(detect_mode(&timeline_with(&[Split, Greenscreen, Pip])), Greenscreen);
    }
}
