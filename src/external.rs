//! Contract for external pre/post-processing command execution (`subproc`).
//!
//! The real subprocess-execution subsystem (argv construction, signal
//! handling, timeouts) lives outside this crate; this module models
//! only `subproc_System`'s call shape, plus a default implementation backed
//! by `std::process::Command` so the Input Preparer's external-file paths
//! are runnable standalone.

use std::io;

/// Synchronous external-command execution.
pub trait ExternalRunner: Send + Sync {
    /// Runs `cmd` with `argv`, waits for exit, and returns the exit code.
    /// `0` means success, matching `subproc_System`'s contract.
    fn run(&self, cmd: &str, argv: &[String]) -> io::Result<i32>;
}

/// `std::process::Command`-backed runner.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandRunner;

impl ExternalRunner for CommandRunner {
    fn run(&self, cmd: &str, argv: &[String]) -> io::Result<i32> {
        let status = std::process::Command::new(cmd).args(argv).status()?;
        Ok(status.code().unwrap_or(-1))
    }
}
