//! Tracing subscriber setup
//!
//! The prompt owns the terminal, so diagnostics never go to stdout or stderr
//! while editing. Logging is opt-in: when `--log-file` is given or `RUST_LOG`
//! is set, events are written to a file.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Default log file for this process: `$TMPDIR/jot-logs/jot-{PID}.log`
pub fn default_log_path() -> PathBuf {
    std::env::temp_dir()
        .join("jot-logs")
        .join(format!("jot-{}.log", std::process::id()))
}

/// Decide where to log, if anywhere.
pub fn log_destination(explicit: Option<&Path>, rust_log: Option<&str>) -> Option<PathBuf> {
    match (explicit, rust_log) {
        (Some(path), _) => Some(path.to_path_buf()),
        (None, Some(filter)) if !filter.is_empty() => Some(default_log_path()),
        _ => None,
    }
}

/// Initialize the global tracing subscriber writing to `log_file_path`.
///
/// Failure to create the file is not fatal: the prompt runs without logs.
pub fn init_global(log_file_path: &Path) -> bool {
    if let Some(parent) = log_file_path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(log_file) = File::create(log_file_path) else {
        return false;
    };

    build_subscriber(log_file).try_init().is_ok()
}

/// Build a subscriber writing to `log_file`.
///
/// `RUST_LOG` controls filtering; without it the crate logs at DEBUG.
pub fn build_subscriber(log_file: File) -> impl tracing::Subscriber + Send + Sync {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}=debug", env!("CARGO_CRATE_NAME"))));

    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}
