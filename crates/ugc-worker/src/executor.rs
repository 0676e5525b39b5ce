//! Render job executor.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, Instrument};
use ugc_media::{build_timeline_with_mode, plan_render, MediaProbe, RenderEvent};
use ugc_models::{ComposeConfig, CompositionMode};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::job::{JobReport, JobStatus, RenderJob};
use crate::logging::{JobLogger, ProgressThrottle};
use crate::metrics;

/// What a successful job produced.
struct Execution {
    script_id: String,
    mode: CompositionMode,
    output: PathBuf,
    command: Option<String>,
}

/// Runs render jobs one at a time.
pub struct JobExecutor {
    config: WorkerConfig,
    compose_config: ComposeConfig,
    probe: Arc<dyn MediaProbe>,
}

impl JobExecutor {
    /// Create an executor probing clips with ffprobe.
    pub fn new(config: WorkerConfig) -> WorkerResult<Self> {
        let compose_config = config.load_compose_config()?;
        let probe = Arc::new(config.probe());
        Ok(Self::from_parts(config, compose_config, probe))
    }

    pub fn from_parts(
        config: WorkerConfig,
        compose_config: ComposeConfig,
        probe: Arc<dyn MediaProbe>,
    ) -> Self {
        Self {
            config,
            compose_config,
            probe,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run a job to its end. Failures are reported, never returned.
    ///
    /// Setting `cancel_rx` to true stops a running render.
    pub async fn run(&self, job: &RenderJob, cancel_rx: watch::Receiver<bool>) -> JobReport {
        let logger = JobLogger::new(&job.job_id, job.operation());
        let started_at = Utc::now();
        let started = Instant::now();
        let mut mode = None;

        logger.log_start(&format!("script {}", job.script_file.display()));

        let result = self
            .execute(job, &logger, cancel_rx, &mut mode)
            .instrument(logger.create_span())
            .await;

        let finished_at = Utc::now();
        match result {
            Ok(execution) => {
                if execution.command.is_some() {
                    metrics::record_dry_run(execution.mode);
                    logger.log_completion("render planned");
                } else {
                    metrics::record_render(execution.mode, started.elapsed().as_secs_f64());
                    logger.log_completion(&format!("rendered {}", execution.output.display()));
                }
                JobReport {
                    job_id: job.job_id.clone(),
                    status: if execution.command.is_some() {
                        JobStatus::Planned
                    } else {
                        JobStatus::Rendered
                    },
                    script_id: Some(execution.script_id),
                    mode: Some(execution.mode),
                    output: Some(execution.output),
                    command: execution.command,
                    error: None,
                    exit_code: 0,
                    started_at,
                    finished_at,
                }
            }
            Err(e) => {
                metrics::record_render_failure(mode, e.reason());
                let status = if e.is_cancelled() {
                    logger.log_warning("render cancelled");
                    JobStatus::Cancelled
                } else {
                    logger.log_error(&e.to_string());
                    if let Some(stderr) = match e {
                        WorkerError::Media(ref media) => media.tool_stderr(),
                        _ => None,
                    } {
                        debug!(job_id = %job.job_id, "Tool stderr:\n{}", stderr);
                    }
                    JobStatus::Failed
                };
                JobReport {
                    job_id: job.job_id.clone(),
                    status,
                    script_id: None,
                    mode,
                    output: None,
                    command: None,
                    error: Some(e.to_string()),
                    exit_code: e.exit_code(),
                    started_at,
                    finished_at,
                }
            }
        }
    }

    async fn execute(
        &self,
        job: &RenderJob,
        logger: &JobLogger,
        mut cancel_rx: watch::Receiver<bool>,
        mode_slot: &mut Option<CompositionMode>,
    ) -> WorkerResult<Execution> {
        job.validate()?;
        let script = job.load_script(&self.config)?;
        let paths = &self.compose_config.paths;
        let output = job.output_path(&self.config, paths, &script.script_id);

        let timeline = build_timeline_with_mode(
            &script,
            &job.avatar_paths(&self.config),
            &job.screencasts_dir(&self.config, paths),
            &output,
            self.probe.as_ref(),
            job.mode,
        )
        .await?;

        let avatars = timeline.avatar_entries().len();
        info!("\n{}", timeline.describe());

        let inputs = job.compose_inputs(&self.config);
        let plan = plan_render(&timeline, &self.compose_config, &inputs, self.probe.as_ref()).await?;
        *mode_slot = Some(plan.mode);

        if plan.mode.uses_auxiliary_clips() && inputs.auxiliary_clips(plan.mode).is_empty() {
            logger.log_warning(&format!(
                "{} render without auxiliary clips, composing without the avatar layer",
                plan.mode
            ));
        }
        logger.log_progress(&format!(
            "{} mode, {} avatars, {} screencasts, {:.1}s",
            plan.mode,
            avatars,
            timeline.screencast_entries().len(),
            plan.total_duration
        ));

        if job.dry_run {
            return Ok(Execution {
                script_id: script.script_id,
                mode: plan.mode,
                output,
                command: Some(plan.command().to_shell_string()),
            });
        }

        let command = plan.progress_command();
        command.ensure_output_dir()?;
        let mut handle = self.config.runner().spawn(command, plan.total_duration);
        let mut throttle = ProgressThrottle::new(self.config.progress_log_step);
        let mut cancel_open = true;

        loop {
            tokio::select! {
                event = handle.next_event() => match event {
                    Some(RenderEvent::Progress { fraction }) => {
                        if throttle.should_log(fraction) {
                            logger.log_progress(&format!("{:.0}%", fraction * 100.0));
                        }
                    }
                    Some(RenderEvent::Completed) | Some(RenderEvent::Failed { .. }) => {}
                    None => break,
                },
                changed = cancel_rx.changed(), if cancel_open => {
                    if changed.is_err() {
                        cancel_open = false;
                    } else if *cancel_rx.borrow() {
                        handle.cancel();
                        cancel_open = false;
                    }
                }
            }
        }
        handle.join().await?;

        Ok(Execution {
            script_id: script.script_id,
            mode: plan.mode,
            output,
            command: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use ugc_media::{MediaError, MediaResult};
    use ugc_models::{Script, Segment};

    /// Every existing file is an 8 second clip with audio.
    struct FixedProbe;

    #[async_trait]
    impl MediaProbe for FixedProbe {
        async fn duration(&self, path: &Path) -> MediaResult<f64> {
            if path.exists() {
                Ok(8.0)
            } else {
                Err(MediaError::FileNotFound(path.to_path_buf()))
            }
        }

        async fn has_audio(&self, _path: &Path) -> MediaResult<bool> {
            Ok(true)
        }
    }

    fn executor(work_dir: &Path) -> JobExecutor {
        let config = WorkerConfig {
            work_dir: work_dir.to_path_buf(),
            ..Default::default()
        };
        JobExecutor::from_parts(config, ComposeConfig::default(), Arc::new(FixedProbe))
    }

    fn write_fixture(dir: &Path) {
        let script = Script::new(
            "EP7",
            "Fixture",
            vec![Segment::new(1, "one", 8.0), Segment::new(2, "two", 8.0)],
        );
        std::fs::write(dir.join("script.json"), serde_json::to_string(&script).unwrap()).unwrap();
        std::fs::write(dir.join("a.mp4"), b"clip").unwrap();
    }

    fn job(json: &str) -> RenderJob {
        serde_json::from_str(json).unwrap()
    }

    fn never_cancelled() -> watch::Receiver<bool> {
        watch::channel(false).1
    }

    #[tokio::test]
    async fn test_dry_run_reports_command() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let job = job(
            r#"{"job_id": "j1", "script_file": "script.json", "avatar_clips": ["a.mp4"],
                "output": "out/EP7.mp4", "dry_run": true}"#,
        );

        let report = executor(dir.path()).run(&job, never_cancelled()).await;

        assert_eq!(report.status, JobStatus::Planned);
        assert_eq!(report.exit_code, 0);
        assert_eq!(report.script_id.as_deref(), Some("EP7"));
        assert_eq!(report.mode, Some(CompositionMode::Overlay));
        let command = report.command.unwrap();
        assert!(command.starts_with("ffmpeg -i "));
        assert!(command.contains("-filter_complex"));
        assert!(!command.contains("-progress"));
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_missing_script_fails() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(r#"{"script_file": "nope.json", "avatar_clips": ["a.mp4"], "dry_run": true}"#);

        let report = executor(dir.path()).run(&job, never_cancelled()).await;

        assert_eq!(report.status, JobStatus::Failed);
        assert_eq!(report.exit_code, 1);
        assert!(report.error.is_some());
        assert!(report.mode.is_none());
    }

    #[tokio::test]
    async fn test_missing_avatar_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let job = job(
            r#"{"script_file": "script.json", "avatar_clips": ["gone.mp4"], "dry_run": true}"#,
        );

        let report = executor(dir.path()).run(&job, never_cancelled()).await;

        assert_eq!(report.status, JobStatus::Failed);
        assert!(report.error.unwrap().contains("gone.mp4"));
    }

    #[tokio::test]
    async fn test_empty_clip_list_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let job = job(r#"{"script_file": "script.json", "avatar_clips": [], "dry_run": true}"#);

        let report = executor(dir.path()).run(&job, never_cancelled()).await;

        assert_eq!(report.status, JobStatus::Failed);
        assert_eq!(report.exit_code, 2);
    }
}
