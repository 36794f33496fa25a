//! Leveled console logging.
//!
//! No `log`/`tracing` dependency here; all diagnostic output funnels through
//! a single atomic level checked at a single call site, in the vocabulary
//! this engine uses for its error taxonomy: `warn` for recoverable
//! per-entry I/O failures, `info` for load-time summaries, `fatal` for
//! invariant violations that are about to abort the process.

use std::sync::atomic::{AtomicU32, Ordering};

/// Silent: nothing is printed.
pub const LEVEL_SILENT: u32 = 0;
/// Only fatal messages (printed just before a panic unwinds).
pub const LEVEL_FATAL: u32 = 1;
/// Fatal + warnings (recoverable I/O failures, malformed lines, etc).
pub const LEVEL_WARN: u32 = 2;
/// Fatal + warnings + informational summaries.
pub const LEVEL_INFO: u32 = 3;

static LEVEL: AtomicU32 = AtomicU32::new(LEVEL_WARN);

/// Sets the process-wide notification level.
pub fn set_level(level: u32) {
    LEVEL.store(level, Ordering::Relaxed);
}

/// Returns the current notification level.
pub fn level() -> u32 {
    LEVEL.load(Ordering::Relaxed)
}

#[doc(hidden)]
pub fn emit(min_level: u32, prefix: &str, msg: std::fmt::Arguments<'_>) {
    if LEVEL.load(Ordering::Relaxed) >= min_level {
        eprintln!("[{prefix}] {msg}");
    }
}

/// Logs a warning: a recoverable I/O failure or a skipped malformed entry.
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::notify::emit($crate::notify::LEVEL_WARN, "WARN", format_args!($($arg)*))
    };
}

/// Logs an informational summary (load counts, phase transitions).
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::notify::emit($crate::notify::LEVEL_INFO, "INFO", format_args!($($arg)*))
    };
}

/// Logs a message immediately before a fatal `panic!`.
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)*) => {
        $crate::notify::emit($crate::notify::LEVEL_FATAL, "FATAL", format_args!($($arg)*))
    };
}
