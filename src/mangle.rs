//! Contract for the mutation engine (`mangle`), invoked as an opaque
//! transform over a prepared buffer. Its internal algorithm is out of scope
//! for this crate; only the call shape is modeled.

/// In-place buffer mutation.
pub trait Mangler: Send + Sync {
    /// Mutates `buf[0..len]` in place, returning the new content length.
    /// May grow the content up to `max_size`; must never write past
    /// `max_size`.
    fn mangle(&self, buf: &mut [u8], len: usize, max_size: usize) -> usize;
}

/// A `Mangler` that leaves the buffer untouched, for callers that have not
/// wired in a real mutation engine yet (tests, the demo harness's `--no-mutate`
/// mode).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMangler;

impl Mangler for NoopMangler {
    fn mangle(&self, _buf: &mut [u8], len: usize, _max_size: usize) -> usize {
        len
    }
}
