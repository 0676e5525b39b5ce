//! FFprobe clip inspection.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Default probe timeout in seconds.
pub const PROBE_TIMEOUT_SECS: u64 = 30;

/// Reads clip facts the compiler needs.
///
/// Implemented by [`FfprobeProbe`] for real files. Tests substitute an in-memory
/// implementation so timelines and graphs can be built without media on disk.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Container duration in seconds.
    async fn duration(&self, path: &Path) -> MediaResult<f64>;

    /// Whether the file carries at least one audio stream.
    async fn has_audio(&self, path: &Path) -> MediaResult<bool>;
}

/// [`MediaProbe`] backed by the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    timeout: Duration,
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl FfprobeProbe {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(PROBE_TIMEOUT_SECS),
        }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    async fn run_ffprobe(&self, path: &Path, args: &[&str]) -> MediaResult<String> {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }

        which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

        debug!("Running FFprobe: ffprobe {} {}", args.join(" "), path.display());

        let child = Command::new("ffprobe")
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| MediaError::Timeout(self.timeout.as_secs()))??;

        if !output.status.success() {
            return Err(MediaError::ffprobe_failed(
                format!("FFprobe failed for {}", path.display()),
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    async fn duration(&self, path: &Path) -> MediaResult<f64> {
        let stdout = self
            .run_ffprobe(
                path,
                &[
                    "-v",
                    "error",
                    "-show_entries",
                    "format=duration",
                    "-of",
                    "default=noprint_wrappers=1:nokey=1",
                ],
            )
            .await?;
        parse_duration(&stdout)
    }

    async fn has_audio(&self, path: &Path) -> MediaResult<bool> {
        let stdout = self
            .run_ffprobe(
                path,
                &[
                    "-v",
                    "error",
                    "-select_streams",
                    "a",
                    "-show_entries",
                    "stream=index",
                    "-of",
                    "csv=p=0",
                ],
            )
            .await?;
        Ok(parse_has_audio(&stdout))
    }
}

/// Parse the bare duration value printed by ffprobe.
pub fn parse_duration(stdout: &str) -> MediaResult<f64> {
    let value = stdout.trim();
    value
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| {
            MediaError::ffprobe_failed(format!("Unparseable duration: {:?}", value), None)
        })
}

/// Any listed audio stream index means the clip has audio.
pub fn parse_has_audio(stdout: &str) -> bool {
    !stdout.trim().is_empty()
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<std::path::PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert!((parse_duration("12.345000\n").unwrap() - 12.345).abs() < 1e-9);
        assert!(parse_duration("N/A").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn test_parse_has_audio() {
        assert!(parse_has_audio("1\n"));
        assert!(parse_has_audio("1\n2\n"));
        assert!(!parse_has_audio(""));
        assert!(!parse_has_audio("\n"));
    }

    #[tokio::test]
    async fn test_missing_file_is_reported_before_spawning() {
        let probe = FfprobeProbe::new().with_timeout(5);
        let err = probe
            .duration(Path::new("/definitely/not/here.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
