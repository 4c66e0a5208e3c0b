use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "ZVAULT_LOG";
const DEFAULT_FILTER: &str = "warn";
const LOG_FILE: &str = "zvault.log";

/// `<cache dir>/zvault/zvault.log`
pub fn log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("zvault").join(LOG_FILE))
}

/// Installs the global subscriber. The terminal is owned by the UI, so
/// output goes to a file; if that file cannot be opened, logging stays off.
pub fn init() {
    let Some(file) = log_path().and_then(|p| open_log(&p)) else {
        return;
    };

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

fn open_log(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}
