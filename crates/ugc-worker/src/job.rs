//! Render job description.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ugc_media::ComposeInputs;
use ugc_models::{CompositionMode, PathsConfig, Script};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};

fn new_job_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// One render, as read from a JSON job file.
///
/// Relative paths are resolved against the worker's work directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderJob {
    #[serde(default = "new_job_id")]
    pub job_id: String,
    /// Parsed script as JSON
    pub script_file: PathBuf,
    /// One avatar clip per segment, in segment order
    pub avatar_clips: Vec<PathBuf>,
    /// Defaults to `paths.screencasts` from the composition config
    #[serde(default)]
    pub screencasts_dir: Option<PathBuf>,
    /// Defaults to `{paths.output}/{script_id}.mp4`
    #[serde(default)]
    pub output: Option<PathBuf>,
    /// Applied to every screencast; `overlay` means no override
    #[serde(default)]
    pub mode: Option<CompositionMode>,
    #[serde(default)]
    pub head_videos: Vec<PathBuf>,
    #[serde(default)]
    pub transparent_avatars: Vec<PathBuf>,
    #[serde(default)]
    pub subtitle_file: Option<PathBuf>,
    #[serde(default)]
    pub music_file: Option<PathBuf>,
    #[serde(default)]
    pub dry_run: bool,
}

impl RenderJob {
    /// Load a job from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> WorkerResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let job: Self = serde_json::from_str(&raw)?;
        job.validate()?;
        Ok(job)
    }

    pub fn validate(&self) -> WorkerResult<()> {
        if self.avatar_clips.is_empty() {
            return Err(WorkerError::invalid_job("job lists no avatar clips"));
        }
        if self.job_id.trim().is_empty() {
            return Err(WorkerError::invalid_job("job id is empty"));
        }
        Ok(())
    }

    /// Operation name used in logs and metrics.
    pub fn operation(&self) -> &'static str {
        if self.dry_run {
            "dry_run"
        } else {
            "render"
        }
    }

    /// Read the script this job points at.
    pub fn load_script(&self, config: &WorkerConfig) -> WorkerResult<Script> {
        let raw = std::fs::read_to_string(config.resolve(&self.script_file))?;
        let script: Script = serde_json::from_str(&raw)?;
        if script.segments.is_empty() {
            return Err(WorkerError::invalid_job(format!(
                "script {} has no segments",
                script.script_id
            )));
        }
        Ok(script)
    }

    pub fn avatar_paths(&self, config: &WorkerConfig) -> Vec<PathBuf> {
        self.avatar_clips.iter().map(|p| config.resolve(p)).collect()
    }

    pub fn screencasts_dir(&self, config: &WorkerConfig, paths: &PathsConfig) -> PathBuf {
        config.resolve(self.screencasts_dir.as_ref().unwrap_or(&paths.screencasts))
    }

    pub fn output_path(&self, config: &WorkerConfig, paths: &PathsConfig, script_id: &str) -> PathBuf {
        match self.output {
            Some(ref output) => config.resolve(output),
            None => config.resolve(paths.output.join(format!("{}.mp4", script_id))),
        }
    }

    /// Optional collaborator artifacts for the composer.
    pub fn compose_inputs(&self, config: &WorkerConfig) -> ComposeInputs {
        let resolve_all = |paths: &[PathBuf]| paths.iter().map(|p| config.resolve(p)).collect();
        let mut inputs = ComposeInputs::new()
            .with_head_videos(resolve_all(&self.head_videos))
            .with_transparent_avatars(resolve_all(&self.transparent_avatars));
        if let Some(ref subs) = self.subtitle_file {
            inputs = inputs.with_subtitles(config.resolve(subs));
        }
        if let Some(ref music) = self.music_file {
            inputs = inputs.with_music(config.resolve(music));
        }
        inputs
    }
}

/// Final state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Planned,
    Rendered,
    Failed,
    Cancelled,
}

/// Summary written once a job ends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: String,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<CompositionMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Copy-pasteable renderer command, for dry runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub exit_code: i32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl JobReport {
    pub fn duration_secs(&self) -> f64 {
        (self.finished_at - self.started_at)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_job_gets_defaults() {
        let job: RenderJob =
            serde_json::from_str(r#"{"script_file": "s.json", "avatar_clips": ["a.mp4"]}"#)
                .unwrap();
        assert!(!job.dry_run);
        assert!(job.mode.is_none());
        assert!(uuid::Uuid::parse_str(&job.job_id).is_ok());
        assert_eq!(job.operation(), "render");
    }

    #[test]
    fn test_job_without_clips_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.json");
        std::fs::write(&path, r#"{"script_file": "s.json", "avatar_clips": []}"#).unwrap();
        let err = RenderJob::from_json_file(&path).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_output_defaults_to_paths_config() {
        let job: RenderJob = serde_json::from_str(
            r#"{"script_file": "s.json", "avatar_clips": ["a.mp4"], "mode": "split"}"#,
        )
        .unwrap();
        let config = WorkerConfig {
            work_dir: PathBuf::from("/work"),
            ..Default::default()
        };
        let paths = PathsConfig::default();

        assert_eq!(job.mode, Some(CompositionMode::Split));
        assert_eq!(
            job.output_path(&config, &paths, "EP1"),
            PathBuf::from("/work/./assets/output/EP1.mp4")
        );
        assert_eq!(
            job.screencasts_dir(&config, &paths),
            PathBuf::from("/work/./assets/screencasts")
        );
    }

    #[test]
    fn test_compose_inputs_resolve_paths() {
        let job: RenderJob = serde_json::from_str(
            r#"{
                "script_file": "s.json",
                "avatar_clips": ["a.mp4"],
                "head_videos": ["h.mp4"],
                "music_file": "/music/bed.mp3"
            }"#,
        )
        .unwrap();
        let config = WorkerConfig {
            work_dir: PathBuf::from("/work"),
            ..Default::default()
        };
        let inputs = job.compose_inputs(&config);
        assert_eq!(inputs.head_videos, vec![PathBuf::from("/work/h.mp4")]);
        assert_eq!(inputs.music_file, Some(PathBuf::from("/music/bed.mp3")));
        assert!(inputs.subtitle_file.is_none());
    }
}
