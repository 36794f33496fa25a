//! Per-worker mmap-backed, resizable byte buffer — the I/O contract with the
//! target program.
//!
//! The target consumes the buffer via a stable file descriptor; the
//! authoritative length is `size`, passed out-of-band, while the mapping
//! itself stays at `max_input_sz` capacity so resizing never triggers a
//! remap. Backed by `memmap2` over a `tempfile`-backed file.

use std::fs::File;
use std::io;

use memmap2::MmapMut;
use tempfile::NamedTempFile;

/// Per-worker mmap-backed buffer.
pub struct DynamicBuffer {
    _backing: NamedTempFile,
    mmap: MmapMut,
    size: usize,
    max_input_sz: usize,
}

impl DynamicBuffer {
    /// Creates a buffer with `max_input_sz` bytes of mapped capacity and a
    /// `size` of zero.
    pub fn new(max_input_sz: usize) -> io::Result<Self> {
        let backing = NamedTempFile::new()?;
        backing.as_file().set_len(max_input_sz as u64)?;
        // SAFETY: `backing` is a private temp file not concurrently modified
        // by another process; the mapping's lifetime is tied to `self` and
        // the file is kept open via `_backing` for as long as the mapping
        // exists.
        let mmap = unsafe { MmapMut::map_mut(backing.as_file())? };
        Ok(DynamicBuffer {
            _backing: backing,
            mmap,
            size: 0,
            max_input_sz,
        })
    }

    /// Current authoritative length, `0 <= size <= max_input_sz`.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Mapped capacity; `bytes()` always returns a view of this length.
    pub fn max_input_sz(&self) -> usize {
        self.max_input_sz
    }

    /// `setSize(n)`: idempotent when `n == size`; fatal when `n > max_input_sz`.
    /// Attempts to truncate the backing file to `n` bytes; a truncation
    /// failure is logged and does not fail the call, since on some platforms
    /// truncating a currently-mapped file is prohibited and the mapping's
    /// capacity remains the contract regardless.
    pub fn set_size(&mut self, n: usize) {
        if n == self.size {
            return;
        }
        if n > self.max_input_sz {
            crate::fatal!(
                "DynamicBuffer::set_size({n}) exceeds max_input_sz ({})",
                self.max_input_sz
            );
            panic!(
                "requested buffer size {n} exceeds max_input_sz {}",
                self.max_input_sz
            );
        }
        if let Err(e) = self._backing.as_file().set_len(n as u64) {
            crate::warn!("failed to truncate dynamic buffer backing file to {n}: {e}");
        }
        self.size = n;
    }

    /// A writable view of length `max_input_sz`. Callers write into
    /// `[0, size())` only; bytes past `size()` are undefined for readers.
    pub fn bytes(&mut self) -> &mut [u8] {
        &mut self.mmap[..self.max_input_sz]
    }

    /// The `[0, size())` prefix currently considered valid content.
    pub fn filled(&self) -> &[u8] {
        &self.mmap[..self.size]
    }

    /// Sets `size` to `data.len()` and copies `data` into the mapping.
    /// Fatal if `data.len() > max_input_sz`.
    pub fn write(&mut self, data: &[u8]) {
        self.set_size(data.len());
        self.mmap[..data.len()].copy_from_slice(data);
    }

    /// Raw file descriptor backing the mapping, stable for the buffer's
    /// lifetime, suitable for handing to the target program.
    #[cfg(unix)]
    pub fn as_raw_fd(&self) -> std::os::unix::io::RawFd {
        use std::os::unix::io::AsRawFd;
        self._backing.as_file().as_raw_fd()
    }

    /// Backing file, for callers that need direct `Read`/`Seek` access
    /// (e.g. the external pre/post-process paths).
    pub fn backing_file(&self) -> &File {
        self._backing.as_file()
    }
}
