//! Streams files from the input directory for the initial dry-run phase:
//! a thread-safe round-robin reader with optional rewind-and-rescan.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::config::derive_max_input_size;
use crate::error::CorpusError;

struct ScrState {
    /// Regular-file entries observed on the last scan, in directory order.
    entries: Vec<OsString>,
    /// Position of the next entry `get_next` will hand out.
    cursor: usize,
}

/// Thread-safe round-robin reader over the static input directory.
///
/// One mutex protects both the cached directory listing and `cursor`,
/// mirroring the single process-wide mutex this reader is built around —
/// modeled as a member of `StaticCorpusReader` rather than a true global.
pub struct StaticCorpusReader {
    input_dir: PathBuf,
    state: Mutex<ScrState>,
    /// Number of regular files observed on the last scan.
    count: AtomicUsize,
    /// Derived buffer capacity from the last scan.
    max_input_sz: AtomicUsize,
}

impl StaticCorpusReader {
    /// `init(hfuzz)`: opens `input_dir` and performs an initial scan.
    /// Returns `Err` if the directory cannot be read at all (realized here
    /// as a `Result` rather than a boolean return).
    pub fn init(input_dir: impl Into<PathBuf>, max_file_sz: usize) -> Result<Self, CorpusError> {
        let input_dir = input_dir.into();
        let reader = StaticCorpusReader {
            input_dir,
            state: Mutex::new(ScrState {
                entries: Vec::new(),
                cursor: 0,
            }),
            count: AtomicUsize::new(0),
            max_input_sz: AtomicUsize::new(0),
        };
        reader.get_dir_stats_and_rewind(max_file_sz)?;
        Ok(reader)
    }

    /// Number of regular files observed on the last scan.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Buffer capacity derived from the last scan (`config::derive_max_input_size`).
    pub fn max_input_sz(&self) -> usize {
        self.max_input_sz.load(Ordering::SeqCst)
    }

    /// `getDirStatsAndRewind`: rewinds the directory, walks all regular
    /// files, counts them, and computes the maximum file size, deriving
    /// `max_input_sz`. Files exceeding `max_file_sz` are logged but still
    /// counted and still contribute to the observed maximum.
    pub fn get_dir_stats_and_rewind(&self, max_file_sz: usize) -> Result<(), CorpusError> {
        let read_dir = fs::read_dir(&self.input_dir).map_err(|source| CorpusError::ScanFailed {
            path: self.input_dir.clone(),
            source,
        })?;

        let mut entries = Vec::new();
        let mut observed_max = 0usize;

        for entry in read_dir {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    crate::warn!("failed to read directory entry: {e}");
                    continue;
                }
            };
            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(e) => {
                    crate::warn!("stat failed for {}: {e}", entry.path().display());
                    continue;
                }
            };
            if !file_type.is_file() {
                continue;
            }
            let len = match entry.metadata() {
                Ok(meta) => meta.len() as usize,
                Err(e) => {
                    crate::warn!("stat failed for {}: {e}", entry.path().display());
                    continue;
                }
            };
            if max_file_sz > 0 && len > max_file_sz {
                crate::warn!(
                    "{} ({len} bytes) exceeds the configured ceiling of {max_file_sz} bytes",
                    entry.path().display()
                );
            }
            observed_max = observed_max.max(len);
            entries.push(entry.file_name());
        }

        let count = entries.len();
        self.count.store(count, Ordering::SeqCst);
        self.max_input_sz
            .store(derive_max_input_size(max_file_sz, observed_max), Ordering::SeqCst);

        let mut state = self.state.lock().unwrap();
        state.entries = entries;
        state.cursor = 0;
        Ok(())
    }

    /// `getNext(rewind)`: returns the next regular file's name, or `None`
    /// once the listing is exhausted and `rewind` is `false`. When `rewind`
    /// is `true` and the listing is exhausted, rescans the directory
    /// (`getDirStatsAndRewind`) and retries once.
    pub fn get_next(&self, rewind: bool, max_file_sz: usize) -> Option<OsString> {
        {
            let mut state = self.state.lock().unwrap();
            if let Some(name) = state.entries.get(state.cursor).cloned() {
                state.cursor += 1;
                return Some(name);
            }
        }
        if !rewind {
            return None;
        }
        if self.get_dir_stats_and_rewind(max_file_sz).is_err() {
            return None;
        }
        let mut state = self.state.lock().unwrap();
        let name = state.entries.get(state.cursor).cloned()?;
        state.cursor += 1;
        Some(name)
    }

    /// Full path to `input_dir/name`.
    pub fn path_for(&self, name: &std::ffi::OsStr) -> PathBuf {
        self.input_dir.join(name)
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &[u8]) {
        let mut f = File::create(dir.join(name)).unwrap();
        f.write_all(content).unwrap();
    }

    #[test]
    fn empty_directory_has_zero_count() {
        let dir = TempDir::new().unwrap();
        let scr = StaticCorpusReader::init(dir.path(), 0).unwrap();
        assert_eq!(scr.count(), 0);
        assert_eq!(scr.get_next(false, 0), None);
    }

    #[test]
    fn round_robins_without_rewind() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a", b"1");
        write_file(dir.path(), "b", b"22");
        let scr = StaticCorpusReader::init(dir.path(), 0).unwrap();
        assert_eq!(scr.count(), 2);
        let first = scr.get_next(false, 0);
        let second = scr.get_next(false, 0);
        assert!(first.is_some());
        assert!(second.is_some());
        assert_ne!(first, second);
        assert_eq!(scr.get_next(false, 0), None);
    }

    #[test]
    fn rewind_restarts_the_cycle() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a", b"1");
        let scr = StaticCorpusReader::init(dir.path(), 0).unwrap();
        assert!(scr.get_next(true, 0).is_some());
        // Exhausted; rewind should re-scan and hand the same file back.
        assert!(scr.get_next(true, 0).is_some());
    }

    #[test]
    fn small_corpus_forces_default_max_input_sz() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a", b"tiny");
        let scr = StaticCorpusReader::init(dir.path(), 0).unwrap();
        assert_eq!(scr.max_input_sz(), crate::config::DEFAULT_SIZE);
    }

    #[test]
    fn oversize_file_still_counted_but_ceiling_clamps_max_input_sz() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "a", &vec![0u8; 100]);
        let scr = StaticCorpusReader::init(dir.path(), 50).unwrap();
        assert_eq!(scr.count(), 1);
        assert_eq!(scr.max_input_sz(), 50);
    }

    #[test]
    fn nonexistent_directory_fails_init() {
        let result = StaticCorpusReader::init("/no/such/directory/at/all", 0);
        assert!(result.is_err());
    }
}
