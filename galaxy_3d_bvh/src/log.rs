//! Diagnostics for Galaxy3D BVH
//!
//! Every message of the crate goes through one process-wide `Logger`
//! (a colored stderr logger unless the host installs its own). Errors are
//! logged with the file and line that rejected the operation.

use colored::*;
use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Destination of every diagnostic emitted by the crate.
///
/// Install one with [`set_logger`] to route messages elsewhere (file,
/// in-game console, test capture...).
///
/// ```no_run
/// use galaxy_3d_bvh::galaxy3d::log::{self, Logger, LogEntry};
///
/// struct SilentLogger;
///
/// impl Logger for SilentLogger {
///     fn log(&self, _entry: &LogEntry) {}
/// }
///
/// log::set_logger(SilentLogger);
/// ```
pub trait Logger: Send + Sync {
    fn log(&self, entry: &LogEntry);
}

/// One diagnostic message
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub severity: LogSeverity,
    pub timestamp: SystemTime,
    /// Emitting component, e.g. "galaxy3d::Bvh" or "galaxy3d::SceneBvh"
    pub source: String,
    pub message: String,
    /// Emitting file and line, set by `bvh_error!` only
    pub file: Option<&'static str>,
    pub line: Option<u32>,
}

/// Severity levels, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogSeverity {
    /// Per-operation tree surgery (reinsertions, refreshes)
    Trace,
    /// Tree lifecycle (creation, clear)
    Debug,
    Info,
    /// Accepted but suspicious input
    Warn,
    /// Rejected operations
    Error,
}

/// Console logger installed until `set_logger` replaces it.
///
/// One line per entry on stderr, so tree diagnostics never mix with the
/// host's stdout: `[timestamp] [SEVERITY] [source] message`, followed by
/// `(file:line)` when the entry carries a location.
pub struct DefaultLogger;

impl DefaultLogger {
    /// Render an entry as a single line (without colors)
    pub fn format_plain(entry: &LogEntry) -> String {
        Self::format_line(entry, severity_label(entry.severity), &entry.source)
    }

    fn format_line(entry: &LogEntry, severity: impl std::fmt::Display, source: impl std::fmt::Display) -> String {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let mut line = format!(
            "[{}] [{}] [{}] {}",
            datetime.format("%Y-%m-%d %H:%M:%S%.3f"),
            severity,
            source,
            entry.message
        );
        if let (Some(file), Some(number)) = (entry.file, entry.line) {
            line.push_str(&format!(" ({}:{})", file, number));
        }
        line
    }
}

/// Fixed-width severity tag
fn severity_label(severity: LogSeverity) -> &'static str {
    match severity {
        LogSeverity::Trace => "TRACE",
        LogSeverity::Debug => "DEBUG",
        LogSeverity::Info => "INFO ",
        LogSeverity::Warn => "WARN ",
        LogSeverity::Error => "ERROR",
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let label = severity_label(entry.severity);
        let severity = match entry.severity {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        };

        eprintln!("{}", Self::format_line(entry, severity, entry.source.bright_blue()));
    }
}

// ===== GLOBAL LOGGER =====

fn logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

/// Install a custom logger for the whole process.
pub fn set_logger<L: Logger + 'static>(logger_impl: L) {
    if let Ok(mut lock) = logger().write() {
        *lock = Box::new(logger_impl);
    }
}

/// Go back to the colored stderr logger.
pub fn reset_logger() {
    set_logger(DefaultLogger);
}

fn dispatch(entry: LogEntry) {
    if let Ok(lock) = logger().read() {
        lock.log(&entry);
    }
}

/// Log a message without source location (target of the `bvh_*!` macros)
pub fn log(severity: LogSeverity, source: &str, message: String) {
    dispatch(LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: source.to_string(),
        message,
        file: None,
        line: None,
    });
}

/// Log a message with the file and line it was emitted from (target of `bvh_error!`)
pub fn log_detailed(
    severity: LogSeverity,
    source: &str,
    message: String,
    file: &'static str,
    line: u32,
) {
    dispatch(LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: source.to_string(),
        message,
        file: Some(file),
        line: Some(line),
    });
}

// ===== LOGGING MACROS =====

#[doc(hidden)]
#[macro_export]
macro_rules! __bvh_log {
    ($severity:ident, $source:expr, $($arg:tt)*) => {
        $crate::log::log($crate::log::LogSeverity::$severity, $source, format!($($arg)*))
    };
}

/// Log a TRACE message (tree surgery details)
#[macro_export]
macro_rules! bvh_trace {
    ($source:expr, $($arg:tt)*) => { $crate::__bvh_log!(Trace, $source, $($arg)*) };
}

/// Log a DEBUG message (tree lifecycle)
///
/// ```no_run
/// galaxy_3d_bvh::bvh_debug!("galaxy3d::Bvh", "Created with margin {}", 0.1);
/// ```
#[macro_export]
macro_rules! bvh_debug {
    ($source:expr, $($arg:tt)*) => { $crate::__bvh_log!(Debug, $source, $($arg)*) };
}

/// Log an INFO message
#[macro_export]
macro_rules! bvh_info {
    ($source:expr, $($arg:tt)*) => { $crate::__bvh_log!(Info, $source, $($arg)*) };
}

/// Log a WARN message (accepted but suspicious input)
#[macro_export]
macro_rules! bvh_warn {
    ($source:expr, $($arg:tt)*) => { $crate::__bvh_log!(Warn, $source, $($arg)*) };
}

/// Log an ERROR message together with `file!()` and `line!()`
///
/// ```no_run
/// galaxy_3d_bvh::bvh_error!("galaxy3d::Bvh", "Rejected handle: {}", "NodeKey(1v1)");
/// ```
#[macro_export]
macro_rules! bvh_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::log::log_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!(),
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
