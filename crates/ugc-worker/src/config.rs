//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use tracing::info;
use ugc_media::{FfprobeProbe, RenderRunner, PROBE_TIMEOUT_SECS, RENDER_TIMEOUT_SECS};
use ugc_models::{ComposeConfig, Validate};

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Timeout for each ffprobe call
    pub probe_timeout: Duration,
    /// Timeout for the whole render
    pub render_timeout: Duration,
    /// Composition config file; defaults are used when unset
    pub config_file: Option<PathBuf>,
    /// Base directory for relative job paths
    pub work_dir: PathBuf,
    /// Prometheus text file written after each job
    pub metrics_file: Option<PathBuf>,
    /// Minimum progress change between two progress log lines
    pub progress_log_step: f64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(PROBE_TIMEOUT_SECS),
            render_timeout: Duration::from_secs(RENDER_TIMEOUT_SECS),
            config_file: None,
            work_dir: PathBuf::from("."),
            metrics_file: None,
            progress_log_step: 0.1,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            probe_timeout: Duration::from_secs(
                std::env::var("UGC_PROBE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(PROBE_TIMEOUT_SECS),
            ),
            render_timeout: Duration::from_secs(
                std::env::var("UGC_RENDER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(RENDER_TIMEOUT_SECS),
            ),
            config_file: std::env::var("UGC_CONFIG_FILE")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            work_dir: std::env::var("UGC_WORK_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            metrics_file: std::env::var("UGC_METRICS_FILE")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            progress_log_step: std::env::var("UGC_PROGRESS_LOG_STEP")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|step: &f64| *step > 0.0 && *step <= 1.0)
                .unwrap_or(defaults.progress_log_step),
        }
    }

    /// Load and validate the composition config.
    pub fn load_compose_config(&self) -> WorkerResult<ComposeConfig> {
        let config = match self.config_file {
            Some(ref path) => {
                info!(path = %path.display(), "Loading composition config");
                ComposeConfig::from_json_file(self.resolve(path))?
            }
            None => ComposeConfig::default(),
        };

        config
            .validate()
            .map_err(|e| WorkerError::config_error(format!("invalid composition config: {}", e)))?;
        Ok(config)
    }

    /// Resolve a job path against the work directory.
    pub fn resolve(&self, path: impl Into<PathBuf>) -> PathBuf {
        let path = path.into();
        if path.is_absolute() {
            path
        } else {
            self.work_dir.join(path)
        }
    }

    pub fn probe(&self) -> FfprobeProbe {
        FfprobeProbe::new().with_timeout(self.probe_timeout.as_secs())
    }

    pub fn runner(&self) -> RenderRunner {
        RenderRunner::new().with_timeout(self.render_timeout.as_secs())
    }
}
