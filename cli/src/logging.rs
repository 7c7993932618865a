//! Diagnostic logging setup

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_NAME: &str = "synthesis-pipeline.log";

/// Keeps the file appender worker alive; hold it until exit
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

pub fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    }
}

/// Console diagnostics go to stderr so stdout carries only the result.
///
/// `RUST_LOG` overrides the level derived from `-v`.
pub fn init(verbose: u8, log_dir: Option<&Path>) -> LogGuard {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(verbose)))
    };

    let mut layers = Vec::new();
    layers.push(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter())
            .boxed(),
    );

    let mut file_guard = None;
    if let Some(dir) = log_dir {
        match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_NAME);
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);
                file_guard = Some(guard);
                layers.push(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false) // Never use ANSI colors in log files
                        .with_writer(non_blocking)
                        .with_filter(filter())
                        .boxed(),
                );
            }
            Err(e) => eprintln!("Failed to create log directory {}: {}", dir.display(), e),
        }
    }

    let _ = tracing_subscriber::registry().with(layers).try_init();

    LogGuard {
        _file_guard: file_guard,
    }
}
