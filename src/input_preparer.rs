//! The façade consumed by worker threads: chooses between static and
//! dynamic sourcing based on fuzzer phase, loads bytes into a worker's
//! `DynamicBuffer`, optionally invokes external pre/post-processing, and
//! optionally hands the buffer to the mutator.

use std::ffi::OsString;
use std::sync::Arc;

use crate::buffer::DynamicBuffer;
use crate::config::Config;
use crate::dynamic_corpus::DynamicCorpus;
use crate::external::ExternalRunner;
use crate::mangle::Mangler;
use crate::phase::{Phase, PhaseOracle};
use crate::static_corpus::StaticCorpusReader;
#[cfg(unix)]
use crate::util::files::clear_cloexec;
use crate::util::files::{dev_fd_path, read_from_fd_seek, write_buf_to_tmp_file};

/// Per-worker state needed across successive `prepare_static_file` calls:
/// whether the current file is still being read in growing prefixes, and
/// which file that is.
#[derive(Debug, Default)]
pub struct WorkerState {
    static_file_try_more: bool,
    current_static_file: Option<OsString>,
}

impl WorkerState {
    pub fn new() -> Self {
        WorkerState::default()
    }

    /// Name of the file currently being read in growing prefixes, if any.
    pub fn current_static_file(&self) -> Option<&std::ffi::OsStr> {
        self.current_static_file.as_deref()
    }
}

/// Ties together the Static Corpus Reader, Dynamic Corpus, a worker's
/// buffer, and the mutation/external-runner collaborators.
pub struct InputPreparer<M, E, P> {
    scr: Arc<StaticCorpusReader>,
    dc: Arc<DynamicCorpus>,
    mangler: M,
    external: E,
    phase_oracle: P,
    config: Config,
}

impl<M, E, P> InputPreparer<M, E, P>
where
    M: Mangler,
    E: ExternalRunner,
    P: PhaseOracle,
{
    pub fn new(
        scr: Arc<StaticCorpusReader>,
        dc: Arc<DynamicCorpus>,
        mangler: M,
        external: E,
        phase_oracle: P,
        config: Config,
    ) -> Self {
        InputPreparer {
            scr,
            dc,
            mangler,
            external,
            phase_oracle,
            config,
        }
    }

    /// `prepareStaticFile(rewind, needs_mangle)`: dry-run phase sourcing.
    ///
    /// During dry-run, the same file is fed back in geometrically growing
    /// prefixes (1024, 2048, … up to `maxInputSz`) to exercise parsers on
    /// partial inputs before the full file; once minimize is enabled, or
    /// the phase has moved past dry-run, the full file is read in one shot.
    /// Returns `None` when the static corpus is exhausted and `rewind` is
    /// false, or when the selected file could not be read.
    pub fn prepare_static_file(
        &self,
        worker: &mut WorkerState,
        buffer: &mut DynamicBuffer,
        rewind: bool,
        needs_mangle: bool,
    ) -> Option<()> {
        let max_input_sz = buffer.max_input_sz();
        let load_new_file = if self.phase_oracle.phase() != Phase::DryRun || self.config.minimize {
            buffer.set_size(max_input_sz);
            true
        } else if !worker.static_file_try_more {
            worker.static_file_try_more = true;
            buffer.set_size(max_input_sz.min(crate::config::DRY_RUN_START_SIZE));
            true
        } else {
            let newsz = buffer.size().saturating_mul(2);
            if newsz >= max_input_sz {
                buffer.set_size(max_input_sz);
                worker.static_file_try_more = false;
            } else {
                buffer.set_size(newsz);
            }
            false
        };

        let name = if load_new_file {
            self.scr.get_next(rewind, self.config.max_file_sz)?
        } else {
            worker.current_static_file.clone()?
        };

        let path = self.scr.path_for(&name);
        let requested = buffer.size();
        let mut file = std::fs::File::open(&path).ok()?;
        let n = read_from_fd_seek(&mut file, buffer.bytes(), requested).ok()?;
        if n < requested {
            worker.static_file_try_more = false;
        }
        buffer.set_size(n);
        worker.current_static_file = Some(name);

        if needs_mangle {
            let cur_size = buffer.size();
            let new_len = self.mangler.mangle(buffer.bytes(), cur_size, max_input_sz);
            buffer.set_size(new_len);
        }

        Some(())
    }

    /// `prepareExternalFile(run)`: writes an empty tmp file, hands its
    /// `/dev/fd/N` path to `cmd`, and on a zero exit reads back up to
    /// `maxInputSz` bytes into `buffer`. A non-zero exit or I/O failure
    /// fails the call.
    pub fn prepare_external_file(&self, buffer: &mut DynamicBuffer, cmd: &str, argv: &[String]) -> bool {
        self.run_external_with_seed(buffer, cmd, argv, &[])
    }

    /// `postProcessFile(run, cmd)`: identical shape to `prepare_external_file`,
    /// but seeds the tmp file with the buffer's current contents first.
    pub fn post_process_file(&self, buffer: &mut DynamicBuffer, cmd: &str, argv: &[String]) -> bool {
        let seed = buffer.filled().to_vec();
        self.run_external_with_seed(buffer, cmd, argv, &seed)
    }

    fn run_external_with_seed(&self, buffer: &mut DynamicBuffer, cmd: &str, argv: &[String], seed: &[u8]) -> bool {
        let work_dir = self.config.effective_output_dir();
        let mut tmp = match write_buf_to_tmp_file(work_dir, seed) {
            Ok(t) => t,
            Err(e) => {
                crate::warn!("failed to create external-command tmp file in {}: {e}", work_dir.display());
                return false;
            }
        };

        #[cfg(unix)]
        if let Err(e) = clear_cloexec(tmp.as_file()) {
            crate::warn!("failed to clear FD_CLOEXEC on external-command tmp file: {e}");
            return false;
        }

        let fd_path = dev_fd_path(tmp.as_file());
        let mut full_argv = Vec::with_capacity(argv.len() + 1);
        full_argv.extend_from_slice(argv);
        full_argv.push(fd_path.to_string_lossy().into_owned());

        let status = match self.external.run(cmd, &full_argv) {
            Ok(s) => s,
            Err(e) => {
                crate::warn!("external command `{cmd}` failed to launch: {e}");
                return false;
            }
        };
        if status != 0 {
            crate::warn!("external command `{cmd}` exited with status {status}");
            return false;
        }

        let max_input_sz = buffer.max_input_sz();
        let n = match read_from_fd_seek(tmp.as_file_mut(), buffer.bytes(), max_input_sz) {
            Ok(n) => n,
            Err(e) => {
                crate::warn!("failed reading external command output back: {e}");
                return false;
            }
        };
        buffer.set_size(n);
        true
    }

    /// `removeStaticFile(dir, name)`: unlinks a rejected static-corpus
    /// candidate; errors are logged, not fatal.
    pub fn remove_static_file(&self, name: &std::ffi::OsStr) {
        let path = self.scr.path_for(name);
        if let Err(e) = std::fs::remove_file(&path) {
            crate::warn!("failed to remove rejected static file {}: {e}", path.display());
        }
    }

    pub fn dynamic_corpus(&self) -> &DynamicCorpus {
        &self.dc
    }

    pub fn static_corpus_reader(&self) -> &StaticCorpusReader {
        &self.scr
    }
}
