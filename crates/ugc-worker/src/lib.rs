//! Render worker for UGC video jobs.
//!
//! This crate provides:
//! - Environment configuration
//! - JSON render jobs and job reports
//! - Job executor with progress logging and cancellation
//! - Structured job logging and render metrics

pub mod config;
pub mod error;
pub mod executor;
pub mod job;
pub mod logging;
pub mod metrics;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use job::{JobReport, JobStatus, RenderJob};
pub use logging::JobLogger;
