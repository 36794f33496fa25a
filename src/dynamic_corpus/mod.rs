//! The in-memory ordered collection of coverage-improving test cases, with
//! sampling cursor, insertion rules, and persistence to an output directory.
//!
//! Realizes the design note's "intrusive list → owned sequence" guidance as
//! an append-only arena (`Vec<Slot>`) linked by `prev`/`next` arena indices:
//! insertion given a position is O(1), and the cursor — an arena index — is
//! never invalidated because entries are never removed during a run.

pub mod sampling;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::buffer::DynamicBuffer;
use crate::config::Config;
use crate::coverage::{beats, CoverageVector};
use crate::phase::Phase;
use crate::util::crc64::content_identity_name;
use crate::util::files::write_buf_to_file_atomic;

/// A single corpus entry.
///
/// `data` never mutates after insertion; it is an
/// `Arc<[u8]>` so `prepare_dynamic_input` can hand out a cheap, independent
/// snapshot while the write lock is briefly held.
#[derive(Debug, Clone)]
pub struct DynFile {
    pub cov: CoverageVector,
    pub size: usize,
    pub data: Arc<[u8]>,
    pub idx: usize,
    pub tested: u32,
    pub path: String,
}

struct Slot {
    file: DynFile,
    prev: Option<usize>,
    next: Option<usize>,
}

struct DcInner {
    arena: Vec<Slot>,
    head: Option<usize>,
    tail: Option<usize>,
    cursor: Option<usize>,
}

impl DcInner {
    fn insert_before(&mut self, new_id: usize, target_id: usize) {
        let prev = self.arena[target_id].prev;
        self.arena[new_id].prev = prev;
        self.arena[new_id].next = Some(target_id);
        self.arena[target_id].prev = Some(new_id);
        match prev {
            Some(p) => self.arena[p].next = Some(new_id),
            None => self.head = Some(new_id),
        }
    }

    fn insert_at_head(&mut self, new_id: usize) {
        self.arena[new_id].prev = None;
        self.arena[new_id].next = self.head;
        if let Some(h) = self.head {
            self.arena[h].prev = Some(new_id);
        }
        self.head = Some(new_id);
        if self.tail.is_none() {
            self.tail = Some(new_id);
        }
    }

    fn insert_at_tail(&mut self, new_id: usize) {
        self.arena[new_id].prev = self.tail;
        self.arena[new_id].next = None;
        if let Some(t) = self.tail {
            self.arena[t].next = Some(new_id);
        }
        self.tail = Some(new_id);
        if self.head.is_none() {
            self.head = Some(new_id);
        }
    }

    /// Scan head→tail; insert before the first entry the new one strictly
    /// beats, else append to tail.
    fn insert_ordered(&mut self, new_id: usize) {
        let new_cov = self.arena[new_id].file.cov;
        let mut cur = self.head;
        while let Some(id) = cur {
            if beats(&new_cov, &self.arena[id].file.cov) {
                self.insert_before(new_id, id);
                return;
            }
            cur = self.arena[id].next;
        }
        self.insert_at_tail(new_id);
    }
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// A consistent snapshot of one selected entry's `(data, size, path)`,
/// handed back to the Input Preparer. The snapshot is taken while the
/// write lock is held, then copied into the caller's buffer after
/// unlocking, so concurrent callers never observe a torn read.
#[derive(Debug, Clone)]
pub struct PreparedInput {
    pub data: Arc<[u8]>,
    pub size: usize,
    pub path: String,
}

impl PreparedInput {
    /// Copies `data[0..size]` into `buffer` via `setSize` then memcpy.
    pub fn copy_into(&self, buffer: &mut DynamicBuffer) {
        buffer.write(&self.data[..self.size]);
    }
}

/// Outcome of one minimization-walk step.
#[derive(Debug)]
pub enum MinimizeStep {
    /// The cursor advanced to an entry and its bytes were copied into the
    /// buffer; `orig_file_name` is that entry's origin label.
    More { orig_file_name: String },
    /// The cursor ran off the tail; the walk is complete.
    Done,
}

/// Process-wide, one-instance, ordered collection of dynamic corpus entries.
pub struct DynamicCorpus {
    inner: RwLock<DcInner>,
    count: AtomicUsize,
    max_entry_size: AtomicUsize,
    last_cov_update: AtomicU64,
    new_units_added: AtomicUsize,
}

impl Default for DynamicCorpus {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicCorpus {
    pub fn new() -> Self {
        DynamicCorpus {
            inner: RwLock::new(DcInner {
                arena: Vec::new(),
                head: None,
                tail: None,
                cursor: None,
            }),
            count: AtomicUsize::new(0),
            max_entry_size: AtomicUsize::new(0),
            last_cov_update: AtomicU64::new(0),
            new_units_added: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn max_entry_size(&self) -> usize {
        self.max_entry_size.load(Ordering::SeqCst)
    }

    pub fn last_cov_update(&self) -> u64 {
        self.last_cov_update.load(Ordering::SeqCst)
    }

    pub fn new_units_added(&self) -> usize {
        self.new_units_added.load(Ordering::SeqCst)
    }

    /// `addDynamicInput(data, len, cov, path)`.
    pub fn add_dynamic_input(
        &self,
        data: &[u8],
        cov: CoverageVector,
        path: impl Into<String>,
        phase: Phase,
        config: &Config,
    ) {
        self.last_cov_update.store(now_unix_secs(), Ordering::SeqCst);

        let mut inner = self.inner.write().unwrap();

        // Step 2: idx = count (pre-increment), tested = 0.
        let assigned_idx = self.count.load(Ordering::SeqCst);
        let new_id = inner.arena.len();
        inner.arena.push(Slot {
            file: DynFile {
                cov,
                size: data.len(),
                data: Arc::from(data),
                idx: assigned_idx,
                tested: 0,
                path: path.into(),
            },
            prev: None,
            next: None,
        });

        if phase == Phase::DynamicMain {
            // Step 3: push to head; cursor references the new entry.
            inner.insert_at_head(new_id);
            inner.cursor = Some(new_id);
        } else {
            // Step 4: insert before the first entry this one strictly beats,
            // else append to tail.
            inner.insert_ordered(new_id);
        }

        // Step 5.
        self.count.fetch_add(1, Ordering::SeqCst);
        self.max_entry_size.fetch_max(data.len(), Ordering::SeqCst);

        drop(inner);

        // Steps 6-7: socket-fuzzer and minimize modes skip persistence.
        if config.socket_fuzzer || config.minimize {
            return;
        }

        // Step 8: write to outputDir (or inputDir if unset).
        write_cov_file(config.effective_output_dir(), data);

        // Step 9.
        if phase == Phase::DynamicMain {
            self.new_units_added.fetch_add(1, Ordering::SeqCst);
            if let Some(cov_dir) = &config.new_cov_dir {
                write_cov_file(cov_dir, data);
            }
        }
    }

    /// `prepareDynamicInput(needs_mangle)` selection half. Mutation is the
    /// Input Preparer's responsibility; this returns the consistent
    /// `(data, size, path)` snapshot.
    pub fn prepare_dynamic_input(&self) -> PreparedInput {
        let total = self.count.load(Ordering::SeqCst);
        if total == 0 {
            crate::fatal!("prepare_dynamic_input called on an empty dynamic corpus");
            panic!("prepare_dynamic_input called on an empty dynamic corpus");
        }

        let mut inner = self.inner.write().unwrap();
        if inner.cursor.is_none() {
            inner.cursor = inner.head;
        }
        let cur_id = inner
            .cursor
            .expect("cursor was just seeded from a non-empty corpus");

        let idx = inner.arena[cur_id].file.idx;
        let test_cnt = sampling::num_tests(idx, total);
        inner.arena[cur_id].file.tested += 1;
        if inner.arena[cur_id].file.tested >= test_cnt {
            inner.arena[cur_id].file.tested = 0;
            inner.cursor = inner.arena[cur_id].next;
        }

        let file = &inner.arena[cur_id].file;
        PreparedInput {
            data: file.data.clone(),
            size: file.size,
            path: file.path.clone(),
        }
    }

    /// `renumerateInputs()`. Walk head→tail assigning
    /// `idx = count, count-1, …, 1`.
    pub fn renumerate_inputs(&self) {
        let mut inner = self.inner.write().unwrap();
        let mut idx = self.count.load(Ordering::SeqCst);
        let mut cur = inner.head;
        while let Some(id) = cur {
            inner.arena[id].file.idx = idx;
            idx = idx.saturating_sub(1);
            cur = inner.arena[id].next;
        }
    }

    /// `prepareDynamicFileForMinimization`. Advances the
    /// cursor one step (seeding it to head if unset), copies the advanced
    /// entry's bytes into `buffer`, and reports whether the walk is done.
    pub fn prepare_dynamic_file_for_minimization(&self, buffer: &mut DynamicBuffer) -> MinimizeStep {
        let mut inner = self.inner.write().unwrap();
        let next_id = match inner.cursor {
            None => inner.head,
            Some(cur) => inner.arena[cur].next,
        };
        inner.cursor = next_id;

        match next_id {
            None => MinimizeStep::Done,
            Some(id) => {
                let file = &inner.arena[id].file;
                let data = file.data.clone();
                let size = file.size;
                let orig_file_name = file.path.clone();
                buffer.write(&data[..size]);
                MinimizeStep::More { orig_file_name }
            }
        }
    }

    /// Snapshot of `(cov, idx)` head→tail, for observing the ordering
    /// invariant in tests.
    pub fn snapshot_order(&self) -> Vec<(CoverageVector, usize)> {
        let inner = self.inner.read().unwrap();
        let mut out = Vec::new();
        let mut cur = inner.head;
        while let Some(id) = cur {
            out.push((inner.arena[id].file.cov, inner.arena[id].file.idx));
            cur = inner.arena[id].next;
        }
        out
    }

    /// The current cursor's coverage vector, if any (for tests).
    pub fn cursor_cov(&self) -> Option<CoverageVector> {
        let inner = self.inner.read().unwrap();
        inner.cursor.map(|id| inner.arena[id].file.cov)
    }
}

/// `writeCovFile(dir, data, len)`. Name is the
/// content-identity of `data`; an existing file with that name is treated
/// as already present. Failures are logged, not fatal.
fn write_cov_file(dir: &std::path::Path, data: &[u8]) {
    let name = content_identity_name(data);
    if let Err(e) = write_buf_to_file_atomic(dir, &name, data) {
        crate::warn!("failed to write corpus entry {name} to {}: {e}", dir.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cov(a: u64, b: u64, c: u64, d: u64) -> CoverageVector {
        CoverageVector::new(a, b, c, d)
    }

    #[test]
    fn ordering_on_insert_non_main() {
        let dc = DynamicCorpus::new();
        let dir = TempDir::new().unwrap();
        let config = Config::new(dir.path());

        dc.add_dynamic_input(b"A", cov(5, 0, 0, 0), "A", Phase::DryRun, &config);
        dc.add_dynamic_input(b"B", cov(5, 1, 0, 0), "B", Phase::DryRun, &config);
        dc.add_dynamic_input(b"C", cov(4, 9, 9, 9), "C", Phase::DryRun, &config);

        let order = dc.snapshot_order();
        let covs: Vec<_> = order.iter().map(|(c, _)| *c).collect();
        assert_eq!(covs, vec![cov(5, 1, 0, 0), cov(5, 0, 0, 0), cov(4, 9, 9, 9)]);
    }

    #[test]
    fn head_insert_in_dynamic_main() {
        let dc = DynamicCorpus::new();
        let dir = TempDir::new().unwrap();
        let config = Config::new(dir.path());

        dc.add_dynamic_input(b"B", cov(5, 1, 0, 0), "B", Phase::DryRun, &config);
        dc.add_dynamic_input(b"A", cov(5, 0, 0, 0), "A", Phase::DryRun, &config);
        dc.add_dynamic_input(b"C", cov(4, 9, 9, 9), "C", Phase::DryRun, &config);
        // Corpus is now [B, A, C].

        dc.add_dynamic_input(b"D", cov(0, 0, 0, 0), "D", Phase::DynamicMain, &config);

        let order = dc.snapshot_order();
        let covs: Vec<_> = order.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            covs,
            vec![cov(0, 0, 0, 0), cov(5, 1, 0, 0), cov(5, 0, 0, 0), cov(4, 9, 9, 9)]
        );
        assert_eq!(dc.cursor_cov(), Some(cov(0, 0, 0, 0)));
    }

    #[test]
    fn renumerate_assigns_strictly_decreasing_idx() {
        let dc = DynamicCorpus::new();
        let dir = TempDir::new().unwrap();
        let config = Config::new(dir.path());

        for i in 0..5u64 {
            dc.add_dynamic_input(&[i as u8], cov(i, 0, 0, 0), format!("f{i}"), Phase::DryRun, &config);
        }
        dc.renumerate_inputs();

        let order = dc.snapshot_order();
        let idxs: Vec<_> = order.iter().map(|(_, idx)| *idx).collect();
        assert_eq!(idxs, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    #[should_panic(expected = "empty dynamic corpus")]
    fn selecting_from_empty_corpus_is_fatal() {
        let dc = DynamicCorpus::new();
        let _ = dc.prepare_dynamic_input();
    }

    #[test]
    fn prepare_dynamic_input_returns_current_entry_and_respects_test_count() {
        let dc = DynamicCorpus::new();
        let dir = TempDir::new().unwrap();
        let config = Config::new(dir.path());
        // Single entry: idx=0 pre-increment, total becomes 1, p = 0 -> 1 test.
        dc.add_dynamic_input(b"only", cov(1, 0, 0, 0), "only", Phase::DryRun, &config);

        let prepared = dc.prepare_dynamic_input();
        assert_eq!(&*prepared.data, b"only");
        assert_eq!(prepared.path, "only");
    }

    #[test]
    fn minimization_walk_visits_each_entry_once_then_reports_done() {
        let dc = DynamicCorpus::new();
        let dir = TempDir::new().unwrap();
        let config = Config::new(dir.path());
        dc.add_dynamic_input(b"A", cov(3, 0, 0, 0), "A", Phase::DryRun, &config);
        dc.add_dynamic_input(b"B", cov(2, 0, 0, 0), "B", Phase::DryRun, &config);

        let mut buffer = DynamicBuffer::new(64).unwrap();
        let mut visited = Vec::new();
        loop {
            match dc.prepare_dynamic_file_for_minimization(&mut buffer) {
                MinimizeStep::More { orig_file_name } => visited.push(orig_file_name),
                MinimizeStep::Done => break,
            }
        }
        assert_eq!(visited, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn write_cov_file_round_trips_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let data = b"content addressed bytes";
        write_cov_file(dir.path(), data);
        let name = content_identity_name(data);
        let read_back = std::fs::read(dir.path().join(&name)).unwrap();
        assert_eq!(read_back, data);

        // Second write of identical content is a successful no-op: still
        // exactly one file, same bytes.
        write_cov_file(dir.path(), data);
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn socket_fuzzer_mode_skips_persistence() {
        let dc = DynamicCorpus::new();
        let dir = TempDir::new().unwrap();
        let mut config = Config::new(dir.path());
        config.socket_fuzzer = true;
        dc.add_dynamic_input(b"data", cov(1, 0, 0, 0), "f", Phase::DryRun, &config);
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(entries.is_empty());
    }

    #[test]
    fn minimize_mode_skips_persistence() {
        let dc = DynamicCorpus::new();
        let dir = TempDir::new().unwrap();
        let mut config = Config::new(dir.path());
        config.minimize = true;
        dc.add_dynamic_input(b"data", cov(1, 0, 0, 0), "f", Phase::DryRun, &config);
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert!(entries.is_empty());
    }

    #[test]
    fn dynamic_main_increments_new_units_added_and_writes_secondary_dir() {
        let dc = DynamicCorpus::new();
        let dir = TempDir::new().unwrap();
        let cov_dir = TempDir::new().unwrap();
        let mut config = Config::new(dir.path());
        config.new_cov_dir = Some(cov_dir.path().to_path_buf());

        dc.add_dynamic_input(b"data", cov(1, 0, 0, 0), "f", Phase::DynamicMain, &config);

        assert_eq!(dc.new_units_added(), 1);
        let primary: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        let secondary: Vec<_> = std::fs::read_dir(cov_dir.path()).unwrap().collect();
        assert_eq!(primary.len(), 1);
        assert_eq!(secondary.len(), 1);
    }

    #[test]
    fn max_entry_size_tracks_the_largest_insertion() {
        let dc = DynamicCorpus::new();
        let dir = TempDir::new().unwrap();
        let config = Config::new(dir.path());
        dc.add_dynamic_input(b"small", cov(1, 0, 0, 0), "a", Phase::DryRun, &config);
        dc.add_dynamic_input(b"a much bigger payload", cov(2, 0, 0, 0), "b", Phase::DryRun, &config);
        dc.add_dynamic_input(b"mid", cov(3, 0, 0, 0), "c", Phase::DryRun, &config);
        assert_eq!(dc.max_entry_size(), "a much bigger payload".len());
    }
}
