use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use env_logger::{Builder, Env, Target};

use crate::app_dirs::AppDirs;
use crate::error::Result;

/// Where logs should go, if anywhere.
///
/// The TUI owns the terminal, so logs only ever go to a file: an explicit
/// `--log-file`, or the default state path when `RUST_LOG` is set.
pub fn log_destination(explicit: Option<&Path>, rust_log_set: bool) -> Option<PathBuf> {
    match explicit {
        Some(p) => Some(p.to_path_buf()),
        None if rust_log_set => AppDirs::log_path(),
        None => None,
    }
}

/// Install the global logger. Returns the file being written, if any.
pub fn init_logging(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    let rust_log_set = std::env::var_os("RUST_LOG").is_some();
    let Some(path) = log_destination(explicit, rust_log_set) else {
        return Ok(None);
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()?;

    log::info!("tapr {} logging to {}", env!("CARGO_PKG_VERSION"), path.display());
    Ok(Some(path))
}
