use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV_VAR: &str = "FLASHR_LOG";
const LOG_FILE_NAME: &str = "flashr.log";

/// Default log locations, most preferred first: the platform state dir,
/// then the local data dir, then the system temp dir.
pub fn default_log_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dirs) = ProjectDirs::from("", "", "flashr") {
        if let Some(state) = dirs.state_dir() {
            paths.push(state.join(LOG_FILE_NAME));
        }
        paths.push(dirs.data_local_dir().join(LOG_FILE_NAME));
    }
    paths.push(std::env::temp_dir().join(LOG_FILE_NAME));
    paths
}

/// Installs the global subscriber. Logs only ever go to a file: the terminal
/// belongs to the TUI. If no file can be opened, events are dropped.
pub fn init_tracing(override_path: Option<&Path>) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let candidates: Vec<PathBuf> = match override_path {
        Some(p) => vec![p.to_path_buf()],
        None => default_log_paths(),
    };
    let (log_file, warnings) = open_log_file(&candidates);

    if let Some((path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %path.display(), "logging initialized");
        for warning in warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    tracing_subscriber::registry().with(env_filter).init();
}

/// Opens the first candidate that works, creating parent directories.
/// Failures on earlier candidates come back as warnings.
pub fn open_log_file(candidates: &[PathBuf]) -> (Option<(PathBuf, File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in candidates {
        if let Some(parent) = candidate.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warnings.push(format!(
                    "Failed to create log dir {}: {e}",
                    parent.display()
                ));
                continue;
            }
        }

        match OpenOptions::new().create(true).append(true).open(candidate) {
            Ok(file) => return (Some((candidate.clone(), file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}
