//! Typed filter graph.
//!
//! Builders append [`Stage`] records to a [`FilterGraph`]. The graph is only
//! serialized to FFmpeg's `-filter_complex` syntax at the end, which keeps
//! labels checkable and lets individual stages be tested on their own.

use std::collections::HashSet;
use std::fmt;

use crate::error::{MediaError, MediaResult};

pub mod audio;
pub mod builders;
pub mod registry;

pub use registry::{GraphBuilder, GraphBuilderRegistry, GraphRequest};

/// Canonical video output label.
pub const VIDEO_OUT: &str = "vout";
/// Canonical audio output label.
pub const AUDIO_OUT: &str = "aout";
/// Concatenated avatar video.
pub const BASE_VIDEO: &str = "base";
/// Concatenated narration audio.
pub const BASE_AUDIO: &str = "audio";

/// Stream selector on a numbered input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Video => "v",
            StreamKind::Audio => "a",
        }
    }
}

/// A stage input: either a stream of an `-i` input or a labelled intermediate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pad {
    Input { index: usize, stream: StreamKind },
    Label(String),
}

impl Pad {
    pub fn video(index: usize) -> Self {
        Pad::Input {
            index,
            stream: StreamKind::Video,
        }
    }

    pub fn audio(index: usize) -> Self {
        Pad::Input {
            index,
            stream: StreamKind::Audio,
        }
    }

    pub fn label(name: impl Into<String>) -> Self {
        Pad::Label(name.into())
    }
}

impl fmt::Display for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pad::Input { index, stream } => write!(f, "[{}:{}]", index, stream.as_str()),
            Pad::Label(name) => write!(f, "[{}]", name),
        }
    }
}

/// One `;`-separated stage: input pads, a comma-joined filter chain, output labels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stage {
    pub inputs: Vec<Pad>,
    pub chain: Vec<String>,
    pub outputs: Vec<String>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input pad.
    pub fn input(mut self, pad: Pad) -> Self {
        self.inputs.push(pad);
        self
    }

    /// Append a filter to the chain.
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.chain.push(filter.into());
        self
    }

    /// Add an output label.
    pub fn output(mut self, label: impl Into<String>) -> Self {
        self.outputs.push(label.into());
        self
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pad in &self.inputs {
            write!(f, "{}", pad)?;
        }
        write!(f, "{}", self.chain.join(","))?;
        for label in &self.outputs {
            write!(f, "[{}]", label)?;
        }
        Ok(())
    }
}

/// Append-only list of stages.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterGraph {
    stages: Vec<Stage>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Stage producing `label`, if any.
    pub fn producer(&self, label: &str) -> Option<&Stage> {
        self.stages
            .iter()
            .find(|s| s.outputs.iter().any(|o| o == label))
    }

    /// Whether any stage produces `label`.
    pub fn produces(&self, label: &str) -> bool {
        self.producer(label).is_some()
    }

    /// Stages whose first filter starts with `name`.
    pub fn stages_using<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Stage> + 'a {
        self.stages.iter().filter(move |s| {
            s.chain
                .first()
                .map(|f| f.starts_with(name))
                .unwrap_or(false)
        })
    }

    /// Rename the output label `from` to `to` where it is produced.
    ///
    /// Only the producing stage changes; later stages that consumed `from`
    /// are rare at this point because the canonical outputs are terminal.
    pub fn rename_output(&mut self, from: &str, to: &str) -> MediaResult<()> {
        if self.produces(to) {
            return Err(MediaError::invalid_graph(format!(
                "label [{}] is already produced",
                to
            )));
        }

        let stage = self
            .stages
            .iter_mut()
            .find(|s| s.outputs.iter().any(|o| o == from))
            .ok_or_else(|| MediaError::invalid_graph(format!("no stage produces [{}]", from)))?;

        for label in stage.outputs.iter_mut().filter(|o| *o == from) {
            *label = to.to_string();
        }
        Ok(())
    }

    /// Check label hygiene: every label produced once, every consumed label
    /// produced earlier, and both canonical outputs present and unconsumed.
    pub fn validate(&self) -> MediaResult<()> {
        let mut produced: HashSet<&str> = HashSet::new();
        let mut consumed: HashSet<&str> = HashSet::new();

        for (i, stage) in self.stages.iter().enumerate() {
            if stage.chain.is_empty() {
                return Err(MediaError::invalid_graph(format!("stage {} has no filters", i)));
            }
            for pad in &stage.inputs {
                if let Pad::Label(name) = pad {
                    if !produced.contains(name.as_str()) {
                        return Err(MediaError::invalid_graph(format!(
                            "stage {} consumes [{}] before it is produced",
                            i, name
                        )));
                    }
                    if !consumed.insert(name.as_str()) {
                        return Err(MediaError::invalid_graph(format!(
                            "label [{}] is consumed more than once",
                            name
                        )));
                    }
                }
            }
            for label in &stage.outputs {
                if !produced.insert(label.as_str()) {
                    return Err(MediaError::invalid_graph(format!(
                        "label [{}] is produced more than once",
                        label
                    )));
                }
            }
        }

        for canonical in [VIDEO_OUT, AUDIO_OUT] {
            if !produced.contains(canonical) {
                return Err(MediaError::invalid_graph(format!("missing [{}] output", canonical)));
            }
            if consumed.contains(canonical) {
                return Err(MediaError::invalid_graph(format!(
                    "[{}] must be a terminal output",
                    canonical
                )));
            }
        }
        Ok(())
    }
}

impl Extend<Stage> for FilterGraph {
    fn extend<I: IntoIterator<Item = Stage>>(&mut self, iter: I) {
        self.stages.extend(iter);
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{}", stage)?;
        }
        Ok(())
    }
}

/// `enable` expression limiting a filter to `[start, end]`.
pub fn enable_between(start: f64, end: f64) -> String {
    format!("enable='between(t,{:.2},{:.2})'", start, end)
}
