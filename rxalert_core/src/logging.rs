//! Tracing setup shared by the `rxalert` CLI and the tray app.
//!
//! The CLI logs to stderr so its stdout stays scriptable. The tray has no
//! terminal, so it appends to a log file next to the inventory instead.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LEVEL: &str = "info";

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Log to stderr at INFO (overridable with `RUST_LOG`).
pub fn init() {
    init_with_level(DEFAULT_LEVEL)
}

/// Log to stderr with `default_level` unless `RUST_LOG` says otherwise.
pub fn init_with_level(default_level: &str) {
    let _ = tracing_subscriber::registry()
        .with(filter(default_level))
        .with(fmt::layer().compact().with_writer(io::stderr))
        .try_init();
}

/// Append log lines to `path`, creating its directory first.
///
/// Falls back to stderr when the file cannot be opened so a read-only data
/// directory never stops the app from starting.
pub fn init_file(path: &Path) {
    let file = match open_log_file(path) {
        Ok(file) => file,
        Err(err) => {
            init();
            tracing::warn!("Cannot open log file {}: {}; logging to stderr", path.display(), err);
            return;
        }
    };

    let _ = tracing_subscriber::registry()
        .with(filter(DEFAULT_LEVEL))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init();
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize logging for testing (captures logs for test output)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
