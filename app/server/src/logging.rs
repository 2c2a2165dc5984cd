//! FILENAME: app/server/src/logging.rs
// PURPOSE: Unified logging system for the server.
// FORMAT: seq|level|category|message

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use log::{LevelFilter, Log, Metadata, Record};
use once_cell::sync::Lazy;

pub use log::Level;

// ============================================================================
// UNIFIED LOGGING SYSTEM
// ============================================================================

/// Global sequence counter shared by every log line.
static LOG_SEQ: AtomicU64 = AtomicU64::new(0);

/// Global log file handle.
pub static LOG_FILE: Lazy<Mutex<Option<File>>> = Lazy::new(|| Mutex::new(None));

static LOGGER: UnifiedLogger = UnifiedLogger;

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

/// Opens (and truncates) the unified log file.
pub fn init_log_file(path: &Path) -> Result<(), String> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create log dir at {:?}: {}", dir, e))?;
    }

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| format!("Failed to create log file {:?}: {}", path, e))?;

    let mut log_file = LOG_FILE.lock().map_err(|e| format!("Lock error: {}", e))?;
    *log_file = Some(file);
    Ok(())
}

/// Routes the `log` facade (used by the core crates) into the unified writer.
/// A second call keeps the first logger and only updates the level.
pub fn install_logger(level: LevelFilter) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

/// Write a log line in unified format
pub fn write_log(level: Level, category: &str, message: &str) {
    if level > log::max_level() {
        return;
    }

    let seq = next_seq();
    let line = format!("{}|{}|{}|{}", seq, level_code(level), category, message);

    if let Ok(mut guard) = LOG_FILE.lock() {
        if let Some(ref mut file) = *guard {
            if let Err(e) = writeln!(file, "{}", line) {
                eprintln!("[LOG_ERROR] Failed to write: {}", e);
            }
            let _ = file.flush();
        }
    }

    println!("{}", line);
}

/// Write an ENTER log line for function entry
pub fn write_log_enter(level: Level, category: &str, func_name: &str, params: &str) {
    let message = if params.is_empty() {
        format!("ENTER {}", func_name)
    } else {
        format!("ENTER {} {}", func_name, params)
    };
    write_log(level, category, &message);
}

/// Write an EXIT log line for function exit
pub fn write_log_exit(level: Level, category: &str, func_name: &str, result: &str) {
    let message = if result.is_empty() {
        format!("EXIT {}", func_name)
    } else {
        format!("EXIT {} {}", func_name, result)
    };
    write_log(level, category, &message);
}

// ============================================================================
// LOG FACADE BRIDGE
// ============================================================================

/// Forwards `log` records; the record target becomes the category.
struct UnifiedLogger;

impl Log for UnifiedLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            write_log(record.level(), record.target(), &record.args().to_string());
        }
    }

    fn flush(&self) {
        if let Ok(mut guard) = LOG_FILE.lock() {
            if let Some(ref mut file) = *guard {
                let _ = file.flush();
            }
        }
    }
}

// ============================================================================
// MACRO DEFINITIONS & EXPORTS
// ============================================================================

#[macro_export]
macro_rules! log_debug {
    ($cat:expr, $($arg:tt)*) => {
        $crate::logging::write_log($crate::logging::Level::Debug, $cat, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($cat:expr, $($arg:tt)*) => {
        $crate::logging::write_log($crate::logging::Level::Info, $cat, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($cat:expr, $($arg:tt)*) => {
        $crate::logging::write_log($crate::logging::Level::Warn, $cat, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($cat:expr, $($arg:tt)*) => {
        $crate::logging::write_log($crate::logging::Level::Error, $cat, &format!($($arg)*))
    };
}

// ENTER/EXIT macros for function tracing

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

// Info-level ENTER/EXIT for request handlers

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

// Re-export the macros so they can be imported via `use crate::logging::log_info;`
pub use log_debug;
pub use log_enter;
pub use log_enter_info;
pub use log_error;
pub use log_exit;
pub use log_exit_info;
pub use log_info;
pub use log_warn;
