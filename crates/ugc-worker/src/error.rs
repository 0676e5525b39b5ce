//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Invalid job: {0}")]
    InvalidJob(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error("Config load error: {0}")]
    ConfigLoad(#[from] ugc_models::ConfigLoadError),

    #[error("Media error: {0}")]
    Media(#[from] ugc_media::MediaError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn invalid_job(msg: impl Into<String>) -> Self {
        Self::InvalidJob(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Caller misuse rather than a tool or environment failure.
    pub fn is_configuration(&self) -> bool {
        match self {
            WorkerError::InvalidJob(_) | WorkerError::ConfigError(_) | WorkerError::ConfigLoad(_) => {
                true
            }
            WorkerError::Media(e) => e.is_configuration(),
            _ => false,
        }
    }

    /// Whether the render was stopped on request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkerError::Media(ugc_media::MediaError::Cancelled))
    }

    /// Short label for failure metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            WorkerError::Media(ugc_media::MediaError::Cancelled) => "cancelled",
            WorkerError::Media(ugc_media::MediaError::Timeout(_)) => "timeout",
            WorkerError::Media(e) if e.is_tool_failure() => "tool",
            _ if self.is_configuration() => "configuration",
            WorkerError::Media(ugc_media::MediaError::MissingFiles(_))
            | WorkerError::Media(ugc_media::MediaError::FileNotFound(_)) => "missing_file",
            _ => "other",
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        if self.is_cancelled() {
            130
        } else if self.is_configuration() {
            2
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ugc_media::MediaError;

    #[test]
    fn test_configuration_classification() {
        assert!(WorkerError::invalid_job("no clips").is_configuration());
        assert!(WorkerError::from(MediaError::configuration("no output")).is_configuration());
        assert!(!WorkerError::from(MediaError::FfmpegNotFound).is_configuration());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(WorkerError::from(MediaError::Cancelled).exit_code(), 130);
        assert_eq!(WorkerError::config_error("bad").exit_code(), 2);
        assert_eq!(WorkerError::from(MediaError::Timeout(300)).exit_code(), 1);
    }

    #[test]
    fn test_failure_reasons() {
        assert_eq!(WorkerError::from(MediaError::Timeout(5)).reason(), "timeout");
        assert_eq!(
            WorkerError::from(MediaError::MissingFiles(vec!["a.mp4".into()])).reason(),
            "missing_file"
        );
        assert_eq!(WorkerError::invalid_job("x").reason(), "configuration");
        assert_eq!(WorkerError::job_failed("x").reason(), "other");
    }
}
