use anyhow::{Context, Result};
use log::LevelFilter;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::config::locations;

const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// Initialize console logging.
///
/// Output goes to stderr so command output on stdout stays scriptable. The
/// level comes from `RUST_LOG` when set, otherwise `warn`, or `debug` when
/// `verbose` is true:
///
/// ```bash
/// # Show every load/save/sync step
/// RUST_LOG=debug gitwise config set default.branch trunk
///
/// # Silence everything
/// RUST_LOG=off gitwise config list
/// ```
pub fn init_logger(verbose: bool) {
    let fallback = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or(fallback);

    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{:5}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(level)
        .target(env_logger::Target::Stderr)
        .try_init()
        .ok(); // Ignore error if logger is already initialized
}

/// Append a timestamped line to the gitwise log file.
///
/// Used for an audit trail of configuration changes.
pub fn log_to_file(message: &str) -> Result<()> {
    let log_path = locations::log_file_path()?;
    append_line(&log_path, message)
}

fn append_line(log_path: &Path, message: &str) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

    writeln!(
        file,
        "[{}] {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        message
    )?;

    Ok(())
}

/// Rotate the log file to `gitwise.log.old` once it exceeds 10MB.
pub fn rotate_log_if_needed() -> Result<()> {
    let log_path = locations::log_file_path()?;
    rotate(&log_path, MAX_LOG_SIZE)
}

fn rotate(log_path: &Path, max_size: u64) -> Result<()> {
    let Ok(metadata) = std::fs::metadata(log_path) else {
        return Ok(());
    };

    if metadata.len() > max_size {
        let old_log_path = log_path.with_extension("log.old");

        if old_log_path.exists() {
            std::fs::remove_file(&old_log_path)?;
        }

        std::fs::rename(log_path, &old_log_path)?;

        log::info!("Log file rotated to {}", old_log_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_logger_twice_is_harmless() {
        init_logger(false);
        init_logger(true);
    }

    #[test]
    fn test_append_line_creates_directories() -> Result<()> {
        let temp = TempDir::new()?;
        let log_path = temp.path().join("nested").join("gitwise.log");

        append_line(&log_path, "first")?;
        append_line(&log_path, "second")?;

        let contents = std::fs::read_to_string(&log_path)?;
        assert!(contents.contains("first"));
        assert!(contents.lines().last().unwrap().ends_with("second"));
        Ok(())
    }

    #[test]
    fn test_rotate_creates_backup() -> Result<()> {
        let temp = TempDir::new()?;
        let log_path = temp.path().join("gitwise.log");
        std::fs::write(&log_path, vec![b'a'; 64])?;

        rotate(&log_path, 32)?;

        assert!(!log_path.exists());
        assert!(temp.path().join("gitwise.log.old").exists());
        Ok(())
    }

    #[test]
    fn test_rotate_leaves_small_log() -> Result<()> {
        let temp = TempDir::new()?;
        let log_path = temp.path().join("gitwise.log");
        std::fs::write(&log_path, b"small")?;

        rotate(&log_path, 32)?;
        rotate(&temp.path().join("missing.log"), 32)?;

        assert!(log_path.exists());
        Ok(())
    }
}
