//! FFmpeg command builder.

use std::path::{Path, PathBuf};

use crate::error::{MediaError, MediaResult};

/// Builder for multi-input FFmpeg compositing commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input files, numbered in insertion order
    inputs: Vec<PathBuf>,
    /// Output file path
    output: PathBuf,
    /// Value of -filter_complex
    filter_complex: Option<String>,
    /// Labels selected with -map
    maps: Vec<String>,
    /// Output arguments (after the graph and maps)
    output_args: Vec<String>,
    /// Machine-readable progress on stdout
    progress: bool,
    /// Whether to overwrite output
    overwrite: bool,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            filter_complex: None,
            maps: Vec::new(),
            output_args: Vec::new(),
            progress: false,
            overwrite: true,
        }
    }

    /// Add an input file.
    pub fn input(mut self, path: impl AsRef<Path>) -> Self {
        self.inputs.push(path.as_ref().to_path_buf());
        self
    }

    /// Add multiple input files.
    pub fn inputs<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.inputs
            .extend(paths.into_iter().map(|p| p.as_ref().to_path_buf()));
        self
    }

    /// Number of inputs added so far; the index the next input will get.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Set filter complex.
    pub fn filter_complex(mut self, graph: impl Into<String>) -> Self {
        self.filter_complex = Some(graph.into());
        self
    }

    /// Select a graph output label.
    pub fn map(mut self, label: &str) -> Self {
        self.maps.push(format!("[{}]", label));
        self
    }

    /// Add output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Move the moov atom to the front for streaming playback.
    pub fn faststart(self) -> Self {
        self.output_args(["-movflags", "+faststart"])
    }

    /// Emit `-progress pipe:1 -nostats`.
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    pub fn output_path(&self) -> &Path {
        &self.output
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        for input in &self.inputs {
            args.push("-i".to_string());
            args.push(input.to_string_lossy().to_string());
        }

        if let Some(ref graph) = self.filter_complex {
            args.push("-filter_complex".to_string());
            args.push(graph.clone());
        }

        for label in &self.maps {
            args.push("-map".to_string());
            args.push(label.clone());
        }

        args.extend(self.output_args.iter().cloned());

        if self.progress {
            args.extend(["-progress", "pipe:1", "-nostats"].map(String::from));
        }

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push(self.output.to_string_lossy().to_string());
        args
    }

    /// Freeze into a runnable command.
    pub fn to_render_command(&self) -> RenderCommand {
        RenderCommand {
            program: "ffmpeg".to_string(),
            args: self.build_args(),
            output: Some(self.output.clone()),
        }
    }
}

/// A fully assembled process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderCommand {
    pub program: String,
    pub args: Vec<String>,
    /// File the process is expected to write
    pub output: Option<PathBuf>,
}

impl RenderCommand {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            output: None,
        }
    }

    /// Program followed by its arguments.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// POSIX-shell rendering, suitable for copy and paste.
    pub fn to_shell_string(&self) -> String {
        self.argv()
            .iter()
            .map(|arg| shell_quote(arg))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Create the output's parent directory if needed.
    pub fn ensure_output_dir(&self) -> MediaResult<()> {
        let Some(parent) = self.output.as_deref().and_then(Path::parent) else {
            return Ok(());
        };
        if parent.as_os_str().is_empty() || parent.exists() {
            return Ok(());
        }
        std::fs::create_dir_all(parent).map_err(MediaError::Io)
    }
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,@%".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder_order() {
        let cmd = FfmpegCommand::new("out/final.mp4")
            .inputs(["a.mp4", "b.mp4"])
            .input("music.mp3")
            .filter_complex("[0:v]null[vout];[0:a]anull[aout]")
            .map("vout")
            .map("aout")
            .output_args(["-c:v", "libx264"])
            .faststart();

        assert_eq!(
            cmd.build_args(),
            vec![
                "-i", "a.mp4", "-i", "b.mp4", "-i", "music.mp3",
                "-filter_complex", "[0:v]null[vout];[0:a]anull[aout]",
                "-map", "[vout]", "-map", "[aout]",
                "-c:v", "libx264", "-movflags", "+faststart",
                "-y", "out/final.mp4",
            ]
        );
        assert_eq!(cmd.input_count(), 3);
    }

    #[test]
    fn test_progress_flags_precede_overwrite() {
        let args = FfmpegCommand::new("o.mp4")
            .input("a.mp4")
            .with_progress(true)
            .build_args();
        let tail: Vec<&str> = args.iter().rev().take(5).rev().map(String::as_str).collect();
        assert_eq!(tail, vec!["-progress", "pipe:1", "-nostats", "-y", "o.mp4"]);
    }

    #[test]
    fn test_shell_string_quotes_graph() {
        let cmd = RenderCommand::new(
            "ffmpeg",
            ["-i", "my clip.mp4", "-filter_complex", "[0:v]null[vout]", "-y", "o.mp4"],
        );
        assert_eq!(
            cmd.to_shell_string(),
            "ffmpeg -i 'my clip.mp4' -filter_complex '[0:v]null[vout]' -y o.mp4"
        );
    }

    #[test]
    fn test_shell_quote_single_quote() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_ensure_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested/deeper/out.mp4");
        let cmd = FfmpegCommand::new(&output).to_render_command();
        cmd.ensure_output_dir().unwrap();
        assert!(output.parent().unwrap().is_dir());
    }
}
