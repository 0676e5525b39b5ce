//! Render process supervision.

use std::future::pending;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::command::RenderCommand;
use crate::error::{MediaError, MediaResult};
use crate::progress::{ProgressTracker, RenderEvent};

/// Default render timeout in seconds.
pub const RENDER_TIMEOUT_SECS: u64 = 300;

enum Outcome {
    Exited(MediaResult<ExitStatus>),
    TimedOut,
    Cancelled,
}

/// Runs a [`RenderCommand`] with progress, timeout and cancellation.
///
/// The child is killed whenever the run ends without a clean exit.
#[derive(Debug, Clone)]
pub struct RenderRunner {
    /// Cancellation signal receiver
    cancel_rx: Option<watch::Receiver<bool>>,
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl Default for RenderRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderRunner {
    /// Create a runner with the default render timeout.
    pub fn new() -> Self {
        Self {
            cancel_rx: None,
            timeout_secs: Some(RENDER_TIMEOUT_SECS),
        }
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Disable the timeout.
    pub fn without_timeout(mut self) -> Self {
        self.timeout_secs = None;
        self
    }

    /// Run a command to completion.
    pub async fn run(&self, cmd: &RenderCommand) -> MediaResult<()> {
        self.run_with_progress(cmd, 0.0, |_| {}).await
    }

    /// Run a command, delivering progress fractions of `total_duration` to `sink`.
    ///
    /// The sink is called on the awaiting task. Successful runs always end
    /// with a `1.0` delivery.
    pub async fn run_with_progress<F>(
        &self,
        cmd: &RenderCommand,
        total_duration: f64,
        mut sink: F,
    ) -> MediaResult<()>
    where
        F: FnMut(f64) + Send,
    {
        which::which(&cmd.program).map_err(|_| match cmd.program.as_str() {
            "ffmpeg" => MediaError::FfmpegNotFound,
            other => MediaError::ProgramNotFound(other.to_string()),
        })?;

        debug!("Running: {}", cmd.to_shell_string());

        let mut child = Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::internal("stdout not captured"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("stderr not captured"))?;

        // Drained separately so a chatty stderr cannot block the process.
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let mut tracker = ProgressTracker::new(total_duration);
        tracker.start();

        let deadline = self
            .timeout_secs
            .map(|secs| Instant::now() + Duration::from_secs(secs));

        let outcome = {
            let mut lines = BufReader::new(stdout).lines();
            let work = async {
                while let Some(line) = lines.next_line().await? {
                    if let Some(fraction) = tracker.observe_line(&line) {
                        sink(fraction);
                    }
                }
                Ok::<ExitStatus, MediaError>(child.wait().await?)
            };
            tokio::pin!(work);

            tokio::select! {
                result = &mut work => Outcome::Exited(result),
                _ = wait_deadline(deadline) => Outcome::TimedOut,
                _ = wait_cancelled(self.cancel_rx.clone()) => Outcome::Cancelled,
            }
        };

        let status = match outcome {
            Outcome::Exited(Ok(status)) => status,
            Outcome::Exited(Err(e)) => {
                warn!("Render stream failed, killing process: {}", e);
                let _ = child.kill().await;
                tracker.fail();
                return Err(e);
            }
            Outcome::TimedOut => {
                let secs = self.timeout_secs.unwrap_or_default();
                warn!("Render timed out after {} seconds, killing process", secs);
                let _ = child.kill().await;
                tracker.fail();
                return Err(MediaError::Timeout(secs));
            }
            Outcome::Cancelled => {
                info!("Render cancelled, killing process");
                let _ = child.kill().await;
                tracker.fail();
                return Err(MediaError::Cancelled);
            }
        };

        let stderr_text = stderr_task.await.unwrap_or_default();

        if !status.success() {
            tracker.fail();
            return Err(MediaError::ffmpeg_failed(
                format!("{} exited with non-zero status", cmd.program),
                Some(stderr_text),
                status.code(),
            ));
        }

        if let Some(fraction) = tracker.complete() {
            sink(fraction);
        }
        Ok(())
    }

    /// Run on a background task, streaming [`RenderEvent`]s.
    ///
    /// Any cancellation receiver already set on this runner is replaced by
    /// the handle's own.
    pub fn spawn(self, cmd: RenderCommand, total_duration: f64) -> RenderHandle {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let runner = self.with_cancel(cancel_rx);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            let progress_tx = events_tx.clone();
            let result = runner
                .run_with_progress(&cmd, total_duration, move |fraction| {
                    let _ = progress_tx.send(RenderEvent::Progress { fraction });
                })
                .await;

            let terminal = match &result {
                Ok(()) => RenderEvent::Completed,
                Err(e) => RenderEvent::Failed {
                    message: e.to_string(),
                },
            };
            let _ = events_tx.send(terminal);
            result
        });

        RenderHandle {
            events: events_rx,
            cancel: cancel_tx,
            task,
        }
    }
}

async fn wait_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => pending::<()>().await,
    }
}

async fn wait_cancelled(cancel_rx: Option<watch::Receiver<bool>>) {
    let Some(mut rx) = cancel_rx else {
        return pending::<()>().await;
    };
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            // sender gone without cancelling
            return pending::<()>().await;
        }
    }
}

/// Handle to a render running on a background task.
pub struct RenderHandle {
    events: mpsc::UnboundedReceiver<RenderEvent>,
    cancel: watch::Sender<bool>,
    task: JoinHandle<MediaResult<()>>,
}

impl RenderHandle {
    /// Next event; `None` once the render has finished and all events are drained.
    pub async fn next_event(&mut self) -> Option<RenderEvent> {
        self.events.recv().await
    }

    /// Ask the render to stop. The process is killed.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// Wait for the render result.
    pub async fn join(self) -> MediaResult<()> {
        self.task
            .await
            .map_err(|e| MediaError::internal(format!("render task failed: {}", e)))?
    }
}
