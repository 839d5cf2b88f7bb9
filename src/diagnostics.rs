//! Logging setup and log-file housekeeping.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

/// Rolling log file prefix (`backoffice.2026-10-19`, ...).
const LOG_FILE_PREFIX: &str = "backoffice";

/// Maximum number of daily log files to keep.
pub const MAX_LOG_FILES: usize = 10;

const APP_DIR: &str = "com.thesmall.backoffice";

/// Per-user data directory: `LOCALAPPDATA`, then `XDG_DATA_HOME`, then the
/// platform default below the home directory.
fn data_dir() -> PathBuf {
    let var = |key: &str| {
        std::env::var_os(key)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    };
    if let Some(dir) = var("LOCALAPPDATA").or_else(|| var("XDG_DATA_HOME")) {
        return dir;
    }
    if cfg!(windows) {
        let home = var("USERPROFILE").unwrap_or_else(|| PathBuf::from("."));
        home.join("AppData").join("Local")
    } else {
        let home = var("HOME").unwrap_or_else(|| PathBuf::from("."));
        home.join(".local").join("share")
    }
}

/// Where the rolling log files go when no directory is configured.
pub fn get_log_dir() -> PathBuf {
    data_dir().join(APP_DIR).join("logs")
}

/// Install the global subscriber: console always, plus a daily rolling file
/// when `config.directory` is set. `RUST_LOG` overrides `config.level`.
///
/// Keep the returned guard alive for the lifetime of the process; dropping
/// it flushes the file writer.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("invalid log filter {:?}", config.level))?;
    let console_layer = fmt::layer().with_target(true);

    let Some(dir) = config.directory.as_deref() else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .try_init()
            .context("failed to install tracing subscriber")?;
        return Ok(None);
    };

    prune_old_logs(dir, MAX_LOG_FILES);
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create log dir {}", dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let (json_layer, text_layer) = if config.json {
        let layer = fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_target(true);
        (Some(layer), None)
    } else {
        let layer = fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true);
        (None, Some(layer))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        log_dir = %dir.display(),
        "back-office logging initialised"
    );
    Ok(Some(guard))
}

/// Delete all but the newest `keep` log files in `dir`. Returns how many
/// were removed.
pub fn prune_old_logs(dir: &Path, keep: usize) -> usize {
    if !dir.exists() {
        return 0;
    }

    let mut log_files: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_log = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with(&format!("{LOG_FILE_PREFIX}.")));
            if is_log {
                let modified = entry
                    .metadata()
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .unwrap_or(std::time::UNIX_EPOCH);
                log_files.push((path, modified));
            }
        }
    }

    // Newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

    let mut removed = 0;
    for (path, _) in log_files.into_iter().skip(keep) {
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove old log file"),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("backoffice-logs-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn prune_keeps_newest_log_files_only() {
        let dir = temp_dir();
        for day in 1..=5 {
            fs::write(dir.join(format!("backoffice.2026-10-0{day}")), "x").unwrap();
        }
        fs::write(dir.join("unrelated.txt"), "keep me").unwrap();

        let removed = prune_old_logs(&dir, 3);
        assert_eq!(removed, 2);

        let mut left: Vec<String> = fs::read_dir(&dir)
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        left.sort();
        assert_eq!(left.len(), 4);
        assert!(left.contains(&"unrelated.txt".to_string()));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn prune_on_missing_dir_is_a_no_op() {
        let dir = std::env::temp_dir().join(format!("backoffice-missing-{}", uuid::Uuid::new_v4()));
        assert_eq!(prune_old_logs(&dir, 1), 0);
    }

    #[test]
    fn log_dir_is_namespaced() {
        assert!(get_log_dir().ends_with("com.thesmall.backoffice/logs"));
    }
}
