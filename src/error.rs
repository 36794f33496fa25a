//! Error types for load-failure and recoverable paths.
//!
//! Fatal invariant violations (an empty corpus selected, an unsorted
//! blacklist, a requested buffer size above `maxInputSz`) are not modeled
//! here: they are programming/operator errors and abort the process
//! directly via `panic!`/`expect`, reserved for unreachable states rather
//! than routed through these `Result` types.

use std::fmt;
use std::path::PathBuf;

/// Load-failure and recoverable error conditions surfaced by this crate.
#[derive(Debug)]
pub enum CorpusError {
    /// The configured input directory does not exist or could not be opened.
    InputDirUnavailable { path: PathBuf, source: std::io::Error },
    /// A directory scan (`readdir`) failed outright.
    ScanFailed { path: PathBuf, source: std::io::Error },
    /// The blacklist file's entries were not in ascending order.
    BlacklistNotSorted { line: usize },
    /// The blacklist file contained no entries after loading.
    BlacklistEmpty,
    /// An external command exited with a non-zero status.
    ExternalCommandFailed { cmd: String, status: i32 },
}

impl fmt::Display for CorpusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorpusError::InputDirUnavailable { path, source } => {
                write!(f, "input directory {} unavailable: {source}", path.display())
            }
            CorpusError::ScanFailed { path, source } => {
                write!(f, "failed to scan directory {}: {source}", path.display())
            }
            CorpusError::BlacklistNotSorted { line } => {
                write!(f, "blacklist not sorted at line {line}")
            }
            CorpusError::BlacklistEmpty => write!(f, "blacklist file is empty"),
            CorpusError::ExternalCommandFailed { cmd, status } => {
                write!(f, "external command `{cmd}` exited with status {status}")
            }
        }
    }
}

impl std::error::Error for CorpusError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CorpusError::InputDirUnavailable { source, .. } => Some(source),
            CorpusError::ScanFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
