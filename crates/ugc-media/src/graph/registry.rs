//! Mode-to-builder dispatch.

use std::collections::HashMap;
use std::path::PathBuf;

use ugc_models::{ComposeConfig, CompositionMode, Timeline};

use super::builders::{GreenscreenBuilder, OverlayBuilder, PipBuilder, SplitBuilder};
use super::FilterGraph;
use crate::error::{MediaError, MediaResult};

/// Everything a builder reads. Borrowed for the duration of one build.
#[derive(Debug, Clone, Copy)]
pub struct GraphRequest<'a> {
    pub timeline: &'a Timeline,
    pub config: &'a ComposeConfig,
    /// One flag per avatar entry, in timeline order
    pub audio_presence: &'a [bool],
    /// Mode-specific clips aligned by avatar index: head cutouts for pip,
    /// background-removed avatars for greenscreen. Empty when unavailable.
    pub auxiliary_clips: &'a [PathBuf],
}

impl<'a> GraphRequest<'a> {
    pub fn new(timeline: &'a Timeline, config: &'a ComposeConfig, audio_presence: &'a [bool]) -> Self {
        Self {
            timeline,
            config,
            audio_presence,
            auxiliary_clips: &[],
        }
    }

    pub fn with_auxiliary_clips(mut self, clips: &'a [PathBuf]) -> Self {
        self.auxiliary_clips = clips;
        self
    }
}

/// Compiles one composition mode into a filter graph ending in `[vout]` and `[aout]`.
pub trait GraphBuilder: Send + Sync {
    /// Mode this builder renders.
    fn mode(&self) -> CompositionMode;

    /// Get the builder name.
    fn name(&self) -> &'static str {
        self.mode().as_str()
    }

    /// Build the graph.
    fn build(&self, request: &GraphRequest<'_>) -> MediaResult<FilterGraph>;
}

/// Lookup from [`CompositionMode`] to its builder.
pub struct GraphBuilderRegistry {
    builders: HashMap<CompositionMode, Box<dyn GraphBuilder>>,
}

impl Default for GraphBuilderRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(OverlayBuilder::new()));
        registry.register(Box::new(PipBuilder::new()));
        registry.register(Box::new(SplitBuilder::new()));
        registry.register(Box::new(GreenscreenBuilder::new()));
        registry
    }
}

impl GraphBuilderRegistry {
    /// Registry with the four built-in builders.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Register a builder, replacing any previous one for the same mode.
    pub fn register(&mut self, builder: Box<dyn GraphBuilder>) {
        self.builders.insert(builder.mode(), builder);
    }

    pub fn get(&self, mode: CompositionMode) -> MediaResult<&dyn GraphBuilder> {
        self.builders
            .get(&mode)
            .map(|b| b.as_ref())
            .ok_or_else(|| MediaError::internal(format!("no graph builder registered for {}", mode)))
    }

    /// Modes without a registered builder.
    pub fn missing_modes(&self) -> Vec<CompositionMode> {
        CompositionMode::ALL
            .iter()
            .copied()
            .filter(|m| !self.builders.contains_key(m))
            .collect()
    }

    /// Build with the builder for `mode`.
    pub fn build(&self, mode: CompositionMode, request: &GraphRequest<'_>) -> MediaResult<FilterGraph> {
        self.get(mode)?.build(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AUDIO_OUT, VIDEO_OUT};
    use ugc_models::TimelineEntry;

    #[test]
    fn test_every_mode_has_a_builder() {
        let registry = GraphBuilderRegistry::new();
        assert!(registry.missing_modes().is_empty());
        for mode in CompositionMode::ALL {
            assert_eq!(registry.get(*mode).unwrap().mode(), *mode);
        }
    }

    #[test]
    fn test_empty_registry_reports_all_modes() {
        let registry = GraphBuilderRegistry::empty();
        assert_eq!(registry.missing_modes().len(), CompositionMode::ALL.len());
        assert!(registry.get(CompositionMode::Pip).is_err());
    }

    #[test]
    fn test_every_builder_ends_in_canonical_outputs() {
        let timeline = Timeline::new(
            "R1",
            16.0,
            vec![
                TimelineEntry::avatar(0.0, 8.0, "a.mp4", 1),
                TimelineEntry::screencast(2.0, 6.0, "s.mp4", 1, CompositionMode::Overlay),
                TimelineEntry::avatar(8.0, 16.0, "b.mp4", 2),
            ],
        );
        let config = ComposeConfig::default();
        let presence = [true, false];
        let registry = GraphBuilderRegistry::new();

        for mode in CompositionMode::ALL {
            let graph = registry
                .build(*mode, &GraphRequest::new(&timeline, &config, &presence))
                .unwrap();
            graph.validate().unwrap();
            let text = graph.to_string();
            assert_eq!(text.matches("[vout]").count(), 1, "{}", mode);
            assert_eq!(text.matches("[aout]").count(), 1, "{}", mode);
            assert!(graph.produces(VIDEO_OUT) && graph.produces(AUDIO_OUT));
        }
    }

    #[test]
    fn test_presence_mismatch_is_configuration_error_for_every_mode() {
        let timeline = Timeline::new(
            "R2",
            8.0,
            vec![TimelineEntry::avatar(0.0, 8.0, "a.mp4", 1)],
        );
        let config = ComposeConfig::default();
        let registry = GraphBuilderRegistry::new();

        for mode in CompositionMode::ALL {
            for presence in [&[][..], &[true, true][..]] {
                let err = registry
                    .build(*mode, &GraphRequest::new(&timeline, &config, presence))
                    .unwrap_err();
                assert!(err.is_configuration(), "{}", mode);
            }
        }
    }
}
