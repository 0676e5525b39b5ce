//! Render worker binary.
//!
//! Usage: `ugc-worker <job.json> [--dry-run]`

use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ugc_worker::metrics::{init_metrics, write_metrics};
use ugc_worker::{JobExecutor, JobStatus, RenderJob, WorkerConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("ugc=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let mut args = std::env::args().skip(1);
    let Some(job_path) = args.next() else {
        error!("Usage: ugc-worker <job.json> [--dry-run]");
        std::process::exit(2);
    };
    let force_dry_run = args.any(|a| a == "--dry-run");

    info!("Starting ugc-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let metrics_handle = match config.metrics_file {
        Some(_) => match init_metrics() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Metrics disabled: {}", e);
                None
            }
        },
        None => None,
    };

    let mut job = match RenderJob::from_json_file(&job_path) {
        Ok(job) => job,
        Err(e) => {
            error!("Failed to load job {}: {}", job_path, e);
            std::process::exit(e.exit_code());
        }
    };
    job.dry_run |= force_dry_run;

    let executor = match JobExecutor::new(config) {
        Ok(e) => e,
        Err(e) => {
            error!("Failed to create job executor: {}", e);
            std::process::exit(e.exit_code());
        }
    };

    // Ctrl-C cancels the running render
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        let _ = cancel_tx.send(true);
    });

    let report = executor.run(&job, cancel_rx).await;

    if let (Some(handle), Some(path)) = (metrics_handle.as_ref(), executor.config().metrics_file.as_ref()) {
        if let Err(e) = write_metrics(handle, path) {
            warn!("Failed to write metrics to {}: {}", path.display(), e);
        }
    }

    match serde_json::to_string(&report) {
        Ok(json) => info!(target: "ugc_worker::report", "{}", json),
        Err(e) => warn!("Failed to serialize job report: {}", e),
    }

    if report.status == JobStatus::Planned {
        if let Some(ref command) = report.command {
            println!("{}", command);
        }
    }

    info!(
        status = ?report.status,
        duration_secs = report.duration_secs(),
        "Worker finished"
    );
    std::process::exit(report.exit_code);
}
