//! FILENAME: app/dashboard/src/logging.rs
// PURPOSE: Unified logging for the dashboard host and the engines below it.
// CONTEXT: The engine crates only talk to the `log` facade. This module installs
// the one logger behind it, writing `seq|LEVEL|category|message` lines so the
// trace of one evaluation can be read (and re-sorted) as a single stream.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use log::{LevelFilter, Metadata};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

pub use log::Level;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// `error`, `warn`, `info`, `debug`, `trace` or `off`.
    #[serde(default = "default_level")]
    pub level: String,

    /// Log file, truncated on init. Console only when absent.
    #[serde(default)]
    pub file: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub echo_stderr: bool,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_level(),
            file: None,
            echo_stderr: true,
        }
    }
}

impl LogConfig {
    /// Unrecognised levels fall back to `info`.
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::Info)
    }
}

// ============================================================================
// UNIFIED LOGGING SYSTEM
// ============================================================================

/// Global sequence counter
static LOG_SEQ: AtomicU64 = AtomicU64::new(0);

/// Global log file handle
static LOG_FILE: Lazy<Mutex<Option<File>>> = Lazy::new(|| Mutex::new(None));

static ECHO_STDERR: AtomicBool = AtomicBool::new(true);

static LOGGER: UnifiedLogger = UnifiedLogger;

struct UnifiedLogger;

impl log::Log for UnifiedLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            write_log(level_code(record.level()), record.target(), &record.args().to_string());
        }
    }

    fn flush(&self) {
        if let Ok(mut guard) = LOG_FILE.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Get next sequence number
pub fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst) + 1
}

fn level_code(level: Level) -> &'static str {
    match level {
        Level::Error => "E",
        Level::Warn => "W",
        Level::Info => "I",
        Level::Debug => "D",
        Level::Trace => "T",
    }
}

fn lock_file() -> Result<MutexGuard<'static, Option<File>>, DashboardError> {
    LOG_FILE
        .lock()
        .map_err(|e| DashboardError::Log(io::Error::new(io::ErrorKind::Other, e.to_string())))
}

/// Installs the unified logger (once per process) and applies `config`.
/// Calling it again swaps the file, level and echo settings.
pub fn init_logging(config: &LogConfig) -> Result<Option<PathBuf>, DashboardError> {
    let log_path = match &config.file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?;
            *lock_file()? = Some(file);
            Some(path.clone())
        }
        None => {
            *lock_file()? = None;
            None
        }
    };

    ECHO_STDERR.store(config.echo_stderr, Ordering::SeqCst);
    // Already installed by an earlier call: only the settings change.
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(config.level_filter());

    log::info!(target: "logging", "logging at {} (file: {:?})", config.level_filter(), log_path);
    Ok(log_path)
}

/// Write a log line in unified format
pub fn write_log(level: &str, category: &str, message: &str) {
    let seq = next_seq();
    let line = format!("{}|{}|{}|{}", seq, level, category, message);

    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(file) = guard.as_mut() {
            if let Err(e) = writeln!(file, "{}", line) {
                eprintln!("[LOG_ERROR] Failed to write: {}", e);
            }
        }
    }

    if ECHO_STDERR.load(Ordering::Relaxed) {
        eprintln!("{}", line);
    }
}

/// Write an ENTER line for function entry
pub fn write_log_enter(level: Level, category: &str, func_name: &str, params: &str) {
    let message = if params.is_empty() {
        format!("ENTER {}", func_name)
    } else {
        format!("ENTER {} {}", func_name, params)
    };
    log::log!(target: category, level, "{}", message);
}

/// Write an EXIT line for function exit
pub fn write_log_exit(level: Level, category: &str, func_name: &str, result: &str) {
    let message = if result.is_empty() {
        format!("EXIT {}", func_name)
    } else {
        format!("EXIT {} {}", func_name, result)
    };
    log::log!(target: category, level, "{}", message);
}

/// Rewrites the log file ordered by sequence number. Returns the line count.
pub fn sort_log_file() -> Result<usize, DashboardError> {
    let mut guard = lock_file()?;
    let file = match guard.as_mut() {
        Some(file) => file,
        None => return Ok(0),
    };

    file.flush()?;
    file.seek(SeekFrom::Start(0))?;

    let mut content = String::new();
    file.read_to_string(&mut content)?;

    let mut lines: Vec<(u64, &str)> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let seq = line
                .split('|')
                .next()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(u64::MAX);
            (seq, line)
        })
        .collect();
    lines.sort_by_key(|(seq, _)| *seq);

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    for (_, line) in &lines {
        writeln!(file, "{}", line)?;
    }
    file.flush()?;

    Ok(lines.len())
}

// ============================================================================
// MACRO DEFINITIONS & EXPORTS
// ============================================================================

#[macro_export]
macro_rules! log_enter {
    ($cat:expr, $func:expr) => {
        $crate::logging::write_log_enter($crate::logging::Level::Debug, $cat, $func, "")
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        $crate::logging::write_log_enter($crate::logging::Level::Debug, $cat, $func, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_exit {
    ($cat:expr, $func:expr) => {
        $crate::logging::write_log_exit($crate::logging::Level::Debug, $cat, $func, "")
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        $crate::logging::write_log_exit($crate::logging::Level::Debug, $cat, $func, &format!($($arg)*))
    };
}

// Info-level ENTER/EXIT for the top-level entry points

#[macro_export]
macro_rules! log_enter_info {
    ($cat:expr, $func:expr) => {
        $crate::logging::write_log_enter($crate::logging::Level::Info, $cat, $func, "")
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        $crate::logging::write_log_enter($crate::logging::Level::Info, $cat, $func, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_exit_info {
    ($cat:expr, $func:expr) => {
        $crate::logging::write_log_exit($crate::logging::Level::Info, $cat, $func, "")
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        $crate::logging::write_log_exit($crate::logging::Level::Info, $cat, $func, &format!($($arg)*))
    };
}

pub use log_enter;
pub use log_enter_info;
pub use log_exit;
pub use log_exit_info;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_and_level_parsing() {
        let config: LogConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LogConfig::default());
        assert_eq!(config.level_filter(), LevelFilter::Info);

        let config: LogConfig = serde_json::from_str(r#"{"level": "DEBUG", "echoStderr": false}"#).unwrap();
        assert_eq!(config.level_filter(), LevelFilter::Debug);
        assert!(!config.echo_stderr);

        let config = LogConfig {
            level: "chatty".to_string(),
            ..LogConfig::default()
        };
        assert_eq!(config.level_filter(), LevelFilter::Info);
    }

    #[test]
    fn sequence_numbers_increase() {
        let a = next_seq();
        let b = next_seq();
        assert!(b > a);
    }
}
