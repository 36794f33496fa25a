//! Read-only query of the surrounding fuzzer's state machine.
//!
//! The phase machine itself lives outside this crate; here it is modeled as
//! the minimal read-only contract the engine actually consumes: the
//! current phase, and a cooperative termination flag checked between cases.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// The three phases the engine distinguishes behavior on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Initial phase: the static corpus is read once, in growing prefixes.
    DryRun,
    /// Steady-state fuzzing loop: new coverage-improving cases feed the
    /// dynamic corpus.
    DynamicMain,
    /// Post-fuzz phase: walk the dynamic corpus once, replay, and keep only
    /// cases that retain coverage.
    Minimize,
}

/// Read-only view of the fuzzer's phase and termination state.
pub trait PhaseOracle: Send + Sync {
    /// Returns the current phase.
    fn phase(&self) -> Phase;
    /// Returns `true` once the run has been asked to stop. Checked
    /// cooperatively between cases; no operation in this crate is
    /// interrupted mid-flight.
    fn terminating(&self) -> bool;
}

const PHASE_DRY_RUN: u8 = 0;
const PHASE_DYNAMIC_MAIN: u8 = 1;
const PHASE_MINIMIZE: u8 = 2;

/// A simple atomic-backed `PhaseOracle`, suitable for a single process with
/// one phase variable shared across worker threads.
pub struct AtomicPhaseOracle {
    phase: AtomicU8,
    terminating: AtomicBool,
}

impl AtomicPhaseOracle {
    /// Creates an oracle starting in `DryRun`, not terminating.
    pub fn new(initial: Phase) -> Self {
        AtomicPhaseOracle {
            phase: AtomicU8::new(phase_to_u8(initial)),
            terminating: AtomicBool::new(false),
        }
    }

    /// Transitions to a new phase.
    pub fn set_phase(&self, phase: Phase) {
        self.phase.store(phase_to_u8(phase), Ordering::SeqCst);
    }

    /// Requests termination; observed by every `terminating()` caller.
    pub fn request_termination(&self) {
        self.terminating.store(true, Ordering::SeqCst);
    }
}

impl Default for AtomicPhaseOracle {
    fn default() -> Self {
        AtomicPhaseOracle::new(Phase::DryRun)
    }
}

impl PhaseOracle for AtomicPhaseOracle {
    fn phase(&self) -> Phase {
        match self.phase.load(Ordering::SeqCst) {
            PHASE_DYNAMIC_MAIN => Phase::DynamicMain,
            PHASE_MINIMIZE => Phase::Minimize,
            _ => Phase::DryRun,
        }
    }

    fn terminating(&self) -> bool {
        self.terminating.load(Ordering::SeqCst)
    }
}

fn phase_to_u8(phase: Phase) -> u8 {
    match phase {
        Phase::DryRun => PHASE_DRY_RUN,
        Phase::DynamicMain => PHASE_DYNAMIC_MAIN,
        Phase::Minimize => PHASE_MINIMIZE,
    }
}
