//! Structured job logging utilities.
//!
//! Provides consistent, structured logging for render jobs with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};

/// Job logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: String,
}

impl JobLogger {
    /// Create a logger for a job.
    ///
    /// # Arguments
    /// * `job_id` - The unique identifier for the job
    /// * `operation` - The type of operation (e.g., "render", "dry_run")
    pub fn new(job_id: &str, operation: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Log the start of a job operation.
    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    /// Log a progress update during job execution.
    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job progress: {}", message
        );
    }

    /// Log a warning during job execution.
    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    /// Log an error during job execution.
    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job error: {}", message
        );
    }

    /// Log the completion of a job operation.
    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Create a tracing span for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            operation = %self.operation
        )
    }
}

/// Emits a progress line each time progress advances by at least `step`.
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    step: f64,
    last_logged: Option<f64>,
}

impl ProgressThrottle {
    pub fn new(step: f64) -> Self {
        Self {
            step,
            last_logged: None,
        }
    }

    /// Returns true when `fraction` should be logged.
    pub fn should_log(&mut self, fraction: f64) -> bool {
        let due = match self.last_logged {
            None => true,
            Some(last) => (fraction >= 1.0 && last < 1.0) || fraction - last >= self.step,
        };
        if due {
            self.last_logged = Some(fraction);
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_logger_creation() {
        let logger = JobLogger::new("job-123", "render");
        assert_eq!(logger.job_id(), "job-123");
        assert_eq!(logger.operation(), "render");
    }

    #[test]
    fn test_progress_throttle() {
        let mut throttle = ProgressThrottle::new(0.25);
        let logged: Vec<f64> = [0.0, 0.1, 0.2, 0.3, 0.5, 0.6, 0.9, 1.0, 1.0]
            .into_iter()
            .filter(|p| throttle.should_log(*p))
            .collect();
        assert_eq!(logged, vec![0.0, 0.3, 0.6, 0.9, 1.0]);
    }
}
