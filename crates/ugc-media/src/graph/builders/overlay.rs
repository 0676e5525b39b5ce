//! Corner overlay: screencasts float over the avatar.

use ugc_models::CompositionMode;

use super::{finalize, start_graph, Layout};
use crate::error::MediaResult;
use crate::graph::registry::{GraphBuilder, GraphRequest};
use crate::graph::FilterGraph;

/// Each screencast is scaled to a fraction of the frame width and chained
/// onto the previous output in its configured corner.
#[derive(Debug, Clone, Default)]
pub struct OverlayBuilder;

impl OverlayBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl GraphBuilder for OverlayBuilder {
    fn mode(&self) -> CompositionMode {
        CompositionMode::Overlay
    }

    fn build(&self, request: &GraphRequest<'_>) -> MediaResult<FilterGraph> {
        let layout = Layout::prepare(request)?;
        let (mut graph, mut current) = start_graph(request, &layout);
        let overlay = &request.config.composition.overlay;

        for (i, entry) in layout.screencasts.iter().enumerate() {
            let output = format!("out{}", i);
            graph.extend(layout.corner_overlay(
                overlay,
                entry,
                layout.screencast_input(i),
                &format!("sc{}", i),
                &current,
                &output,
            ));
            current = output;
        }

        finalize(&mut graph, &current, request);
        Ok(graph)
    }
}
