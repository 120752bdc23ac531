//! Logging setup
//!
//! - JSON file logs with daily rotation under `<data_dir>/logs`
//! - Human-readable stdout logs for the server
//! - `log` crate events bridged into `tracing`
//! - miette hook for fatal error reports

use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "profile-wizard.log";

/// Default filter when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// `<data_dir>/logs`, created if missing.
pub fn log_dir(data_dir: &Path) -> PathBuf {
    let dir = data_dir.join("logs");
    if !dir.exists() {
        if let Err(e) = fs::create_dir_all(&dir) {
            eprintln!("Failed to create logs directory: {}", e);
        }
    }
    dir
}

/// Initialize logging for the backend server: JSON file plus pretty stdout.
///
/// Returns a `WorkerGuard` which must be kept alive for the duration of the
/// process so buffered logs are flushed on shutdown.
pub fn init(data_dir: &Path) -> WorkerGuard {
    let log_dir = log_dir(data_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(true)
        .with_filter(env_filter());

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .pretty()
        .with_filter(env_filter());

    if let Err(e) = tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
    {
        eprintln!("Failed to initialize tracing subscriber: {}", e);
    }

    finish_init(&log_dir);
    guard
}

/// Initialize logging for TUI mode.
///
/// Identical to [`init()`] but omits the stdout layer to avoid corrupting
/// the terminal while ratatui is in raw/alternate-screen mode.
pub fn init_tui(data_dir: &Path) -> WorkerGuard {
    let log_dir = log_dir(data_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(true)
        .with_filter(env_filter());

    // No stdout layer, the TUI owns the terminal
    if let Err(e) = tracing_subscriber::registry().with(file_layer).try_init() {
        eprintln!("Failed to initialize tracing subscriber: {}", e);
    }

    finish_init(&log_dir);
    guard
}

fn finish_init(log_dir: &Path) {
    if let Err(e) = tracing_log::LogTracer::init() {
        // Already set when tracing-subscriber's own log bridge is active
        tracing::debug!(error = %e, "LogTracer not installed");
    }

    init_miette();

    tracing::info!(
        path = %log_dir.join(LOG_FILE_PREFIX).display(),
        "Logging initialized (daily rolling)"
    );
}

fn init_miette() {
    let color = io::stderr().is_terminal();
    miette::set_hook(Box::new(move |_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .unicode(true)
                .context_lines(3)
                .tab_width(4)
                .break_words(true)
                .color(color)
                .build(),
        )
    }))
    .ok(); // Ignore if already set
}

/// Fatal startup failure, rendered through the miette hook.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code("PROFILE_WIZARD::STARTUP"))]
pub struct StartupError {
    message: String,

    #[help]
    help_text: Option<String>,
}

impl StartupError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            help_text: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help_text = Some(help.into());
        self
    }
}

/// Print a fatal error through miette's graphical handler.
pub fn report_fatal(error: StartupError) {
    eprintln!("{:?}", miette::Report::new(error));
}
