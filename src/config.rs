//! Run configuration and size constants for the corpus engine.
//!
//! Mirrors the "hfuzz" run-configuration object referenced throughout the
//! component design: a plain value struct assembled by the embedder (CLI,
//! daemon, test harness) rather than parsed from a file by this crate.

use std::path::PathBuf;

/// Default buffer capacity used when the operator has not set an explicit
/// ceiling and the static corpus's largest observed file is smaller than
/// this value.
pub const DEFAULT_SIZE: usize = 8 * 1024;

/// Upper bound on the derived buffer capacity when the operator has not set
/// an explicit ceiling and the static corpus's largest observed file exceeds
/// this value.
pub const MAX_SIZE: usize = 8 * 1024 * 1024;

/// Starting prefix size used during the dry-run geometric-growth walk
/// (`shouldReadNewFile`), clamped to `maxInputSz`.
pub const DRY_RUN_START_SIZE: usize = 1024;

/// Run-wide configuration shared by every worker.
///
/// Corresponds to the fields of `hfuzz` this crate consults: `inputDir`,
/// `outputDir`, the optional "new coverage" directory, the operator's
/// file-size ceiling, and the socket-fuzzer / minimize mode flags.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the initial static corpus. Required.
    pub input_dir: PathBuf,
    /// Directory newly discovered dynamic-corpus entries are written to.
    /// Falls back to `input_dir` when unset, matching `addDynamicInput`'s
    /// "outputDir (or inputDir if no output dir)" rule.
    pub output_dir: Option<PathBuf>,
    /// Secondary directory that also receives a copy of entries discovered
    /// while in the dynamic-main phase ("new-coverage directory").
    pub new_cov_dir: Option<PathBuf>,
    /// Operator-imposed ceiling on input size, in bytes. `0` means unset.
    pub max_file_sz: usize,
    /// Socket-fuzzer mode: newly inserted dynamic entries are not persisted
    /// to disk.
    pub socket_fuzzer: bool,
    /// Minimization mode: newly inserted dynamic entries are not persisted
    /// to disk (minimize only replays and prunes, never writes new ones).
    pub minimize: bool,
}

impl Config {
    /// Constructs a configuration pointing at `input_dir`, leaving every
    /// optional field at its default (no output dir override, no ceiling,
    /// neither socket-fuzzer nor minimize mode).
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Config {
            input_dir: input_dir.into(),
            output_dir: None,
            new_cov_dir: None,
            max_file_sz: 0,
            socket_fuzzer: false,
            minimize: false,
        }
    }

    /// Directory newly discovered entries are written to: `output_dir` if
    /// set, otherwise `input_dir`.
    pub fn effective_output_dir(&self) -> &std::path::Path {
        self.output_dir.as_deref().unwrap_or(&self.input_dir)
    }
}

/// Derives `maxInputSz` from the operator ceiling and the largest file
/// observed while scanning the input directory (`getDirStatsAndRewind`).
///
/// - if the operator set a ceiling (`max_file_sz > 0`), that ceiling wins
///   outright;
/// - otherwise the observed maximum is clamped into `[DEFAULT_SIZE, MAX_SIZE]`.
///
/// Files larger than the operator ceiling still count toward `observed_max`
/// upstream (the scan does not filter them out); this function only clamps
/// the derived capacity.
pub fn derive_max_input_size(max_file_sz: usize, observed_max: usize) -> usize {
    if max_file_sz > 0 {
        return max_file_sz;
    }
    observed_max.clamp(DEFAULT_SIZE, MAX_SIZE)
}
