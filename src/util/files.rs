//! Low-level file I/O helpers: atomic write, tmp-file creation, fd read-from-seek.
//!
//! These conceptually belong to the surrounding fuzzer's own file-I/O layer,
//! but a concrete implementation lives here because `write_cov_file` and the
//! external pre/post-process paths of the Input Preparer both need working
//! tmp-file and atomic-write primitives to run at all. Built on `tempfile`,
//! used here as a runtime dependency rather than just a dev one, since it is
//! exercised outside of tests.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Writes `data` to `path` with exclusive create semantics: if a file at
/// `path` already exists, this is a successful no-op (content-addressed
/// names make "already present" equivalent to "already written"). The write
/// itself goes through a temp file in the same directory followed by a
/// rename, so a crash mid-write never leaves a partial file at `path`.
pub fn write_buf_to_file_atomic(dir: &Path, name: &str, data: &[u8]) -> io::Result<()> {
    let dest = dir.join(name);
    if dest.exists() {
        return Ok(());
    }
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    match tmp.persist_noclobber(&dest) {
        Ok(_) => Ok(()),
        // Lost a race with another writer producing the same content-addressed
        // name: treat exactly like the pre-existence check above.
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e.error),
    }
}

/// Creates an empty temp file in `dir` and returns it still open, so a
/// caller can pass its `/dev/fd/N` path to an external command and later
/// read back whatever that command wrote.
pub fn create_tmp_file(dir: &Path) -> io::Result<NamedTempFile> {
    NamedTempFile::new_in(dir)
}

/// Writes `data` into a temp file and returns it, seeked back to the start,
/// ready to be re-read or handed to a post-processing command by path.
pub fn write_buf_to_tmp_file(dir: &Path, data: &[u8]) -> io::Result<NamedTempFile> {
    let mut tmp = create_tmp_file(dir)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.as_file_mut().seek(SeekFrom::Start(0))?;
    Ok(tmp)
}

/// Seeks `file` to the start and reads up to `max_len` bytes into `dst`,
/// returning the number of bytes read.
pub fn read_from_fd_seek(file: &mut File, dst: &mut [u8], max_len: usize) -> io::Result<usize> {
    file.seek(SeekFrom::Start(0))?;
    let cap = max_len.min(dst.len());
    let mut total = 0;
    while total < cap {
        let n = file.read(&mut dst[total..cap])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}

/// `/dev/fd/N` path for a temp file's raw descriptor, used to hand a live
/// file descriptor to an external command by path on Unix.
#[cfg(unix)]
pub fn dev_fd_path(file: &File) -> std::path::PathBuf {
    use std::os::unix::io::AsRawFd;
    std::path::PathBuf::from(format!("/dev/fd/{}", file.as_raw_fd()))
}

/// Clears `FD_CLOEXEC` on `file`'s descriptor so a subsequently spawned
/// child process inherits it at the same descriptor number — required for
/// a `/dev/fd/N` path built by [`dev_fd_path`] to resolve to anything once
/// handed to an external command.
#[cfg(unix)]
pub fn clear_cloexec(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;
    let fd = file.as_raw_fd();
    // SAFETY: `fd` is a valid, open descriptor for the lifetime of `file`,
    // which outlives this call.
    unsafe {
        let flags = libc::fcntl(fd, libc::F_GETFD);
        if flags < 0 {
            return Err(io::Error::last_os_error());
        }
        if libc::fcntl(fd, libc::F_SETFD, flags & !libc::FD_CLOEXEC) < 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_file_with_content() {
        let dir = TempDir::new().unwrap();
        write_buf_to_file_atomic(dir.path(), "a.cov", b"hello").unwrap();
        let read_back = std::fs::read(dir.path().join("a.cov")).unwrap();
        assert_eq!(read_back, b"hello");
    }

    #[test]
    fn atomic_write_is_idempotent_noop_on_existing_name() {
        let dir = TempDir::new().unwrap();
        write_buf_to_file_atomic(dir.path(), "a.cov", b"first").unwrap();
        // Second write with different bytes but the same name must not
        // overwrite — content-addressed names treat "exists" as "done".
        write_buf_to_file_atomic(dir.path(), "a.cov", b"second-and-different").unwrap();
        let read_back = std::fs::read(dir.path().join("a.cov")).unwrap();
        assert_eq!(read_back, b"first");
    }

    #[test]
    fn write_then_read_tmp_file_roundtrips() {
        let dir = TempDir::new().unwrap();
        let mut tmp = write_buf_to_tmp_file(dir.path(), b"round trip me").unwrap();
        let mut buf = [0u8; 64];
        let buf_len = buf.len();
        let n = read_from_fd_seek(tmp.as_file_mut(), &mut buf, buf_len).unwrap();
        assert_eq!(&buf[..n], b"round trip me");
    }

    #[test]
    fn read_from_fd_seek_respects_max_len() {
        let dir = TempDir::new().unwrap();
        let mut tmp = write_buf_to_tmp_file(dir.path(), b"0123456789").unwrap();
        let mut buf = [0u8; 64];
        let n = read_from_fd_seek(tmp.as_file_mut(), &mut buf, 4).unwrap();
        assert_eq!(n, 4);
        assert_eq!(&buf[..4], b"0123");
    }

    #[test]
    fn clear_cloexec_unsets_the_close_on_exec_flag() {
        use std::os::unix::io::AsRawFd;
        let dir = TempDir::new().unwrap();
        let tmp = create_tmp_file(dir.path()).unwrap();
        let fd = tmp.as_file().as_raw_fd();
        let before = unsafe { libc::fcntl(fd, libc::F_GETFD) };
        assert_ne!(before & libc::FD_CLOEXEC, 0, "tempfile is expected to start as close-on-exec");

        clear_cloexec(tmp.as_file()).unwrap();
        let after = unsafe { libc::fcntl(fd, libc::F_GETFD) };
        assert_eq!(after & libc::FD_CLOEXEC, 0);
    }
}
