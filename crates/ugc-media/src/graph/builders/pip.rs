//! Picture-in-picture: the screencast fills the frame and a head cutout
//! of the presenter sits in a corner.

use tracing::debug;
use ugc_models::CompositionMode;

use super::{finalize, start_graph, Layout};
use crate::error::MediaResult;
use crate::graph::registry::{GraphBuilder, GraphRequest};
use crate::graph::{enable_between, FilterGraph, Pad, Stage};

/// Pip-tagged screencasts replace the avatar during their window. Other
/// screencasts in the same render keep the corner overlay placement and are
/// applied first. Head cutouts come from the auxiliary clips, one per avatar.
#[derive(Debug, Clone, Default)]
pub struct PipBuilder;

impl PipBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl GraphBuilder for PipBuilder {
    fn mode(&self) -> CompositionMode {
        CompositionMode::Pip
    }

    fn build(&self, request: &GraphRequest<'_>) -> MediaResult<FilterGraph> {
        let layout = Layout::prepare(request)?;
        let (mut graph, mut current) = start_graph(request, &layout);
        let composition = &request.config.composition;

        for (i, entry) in layout.screencasts.iter().enumerate() {
            if entry.composition_mode == CompositionMode::Pip {
                continue;
            }
            let output = format!("ov{}", i);
            graph.extend(layout.corner_overlay(
                &composition.overlay,
                entry,
                layout.screencast_input(i),
                &format!("osc{}", i),
                &current,
                &output,
            ));
            current = output;
        }

        let pip = &composition.pip;
        for (i, entry) in layout.screencasts.iter().enumerate() {
            if entry.composition_mode != CompositionMode::Pip {
                continue;
            }
            let enable = enable_between(entry.start, entry.end);

            let scaled = format!("psc{}", i);
            graph.push(layout.fill_frame(Pad::video(layout.screencast_input(i)), scaled.clone()));

            let background = format!("pip_sc{}", i);
            graph.push(
                Stage::new()
                    .input(Pad::label(current))
                    .input(Pad::label(scaled))
                    .filter(format!("overlay=0:0:{}", enable))
                    .output(background.clone()),
            );
            current = background;

            let head = request
                .timeline
                .avatar_index_for_segment(entry.parent_segment)
                .filter(|idx| *idx < request.auxiliary_clips.len());
            let Some(avatar_idx) = head else {
                debug!(screencast = i, "No head cutout for pip window, background only");
                continue;
            };

            let (x, y) = pip.head_position.overlay_coords(pip.head_margin, "w", "h");
            let with_head = format!("pip_h{}", i);
            graph.push(
                Stage::new()
                    .input(Pad::label(current))
                    .input(Pad::video(layout.auxiliary_input(avatar_idx)))
                    .filter(format!("overlay=x={}:y={}:{}", x, y, enable))
                    .output(with_head.clone()),
            );
            current = with_head;
        }

        finalize(&mut graph, &current, request);
        Ok(graph)
    }
}
