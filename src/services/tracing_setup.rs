//! Global tracing subscriber for the shell binary.
//!
//! Logs go to a file so they never mix with the interactive shell's output.
//! The filter comes from `RUST_LOG`, defaulting to `info`.

use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default log file: `<temp_dir>/jellypie.log`
pub fn default_log_path() -> PathBuf {
    std::env::temp_dir().join(format!("{}.log", crate::config_io::APP_NAME))
}

/// Install the global subscriber writing to `log_file`.
///
/// Failing to open the file is not fatal; logging is simply disabled.
pub fn init_global(log_file: &Path) {
    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Could not open log file {}: {}", log_file.display(), e);
            return;
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false),
        )
        .with(filter)
        .try_init();
}
