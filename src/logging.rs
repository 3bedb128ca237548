//! Logging setup for the QueryDesk shell.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` overrides the `info` default.
///
/// Logs go to `log_file` when given (truncated on each run), otherwise to
/// stderr. If the file cannot be created the shell keeps logging to stderr.
pub fn init(log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file.map(open_log_file) {
        Some(Ok(file)) => builder.with_writer(file).with_ansi(false).init(),
        Some(Err(e)) => {
            builder.with_writer(std::io::stderr).init();
            tracing::warn!("Could not open log file, logging to stderr: {}", e);
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    File::create(path)
}

/// Where `--log-file` writes: `querydesk/querydesk.log` under the state
/// directory, else the config directory, else the temp directory.
pub fn log_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::config_dir)
        .map(|dir| dir.join("querydesk").join("querydesk.log"))
        .unwrap_or_else(|| std::env::temp_dir().join("querydesk.log"))
}
