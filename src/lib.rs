//! The input-corpus engine of a coverage-guided fuzzer: the static corpus
//! reader, the dynamic corpus with its sampling cursor and persistence, the
//! mmap-backed per-worker buffer, the dictionary and blacklist loaders, and
//! the Input Preparer façade that ties them together for worker threads.

pub mod blacklist;
pub mod buffer;
pub mod config;
pub mod coverage;
pub mod dictionary;
pub mod dynamic_corpus;
pub mod error;
pub mod external;
pub mod input_preparer;
pub mod mangle;
pub mod notify;
pub mod phase;
pub mod static_corpus;
pub mod threadpool;
pub mod util;

pub use blacklist::{load_blacklist, Blacklist};
pub use buffer::DynamicBuffer;
pub use config::Config;
pub use coverage::{cmp_cov, CoverageVector};
pub use dictionary::{load_dictionary, DictEntry, Dictionary};
pub use dynamic_corpus::{DynFile, DynamicCorpus, MinimizeStep, PreparedInput};
pub use error::CorpusError;
pub use external::{CommandRunner, ExternalRunner};
pub use input_preparer::{InputPreparer, WorkerState};
pub use mangle::{Mangler, NoopMangler};
pub use phase::{AtomicPhaseOracle, Phase, PhaseOracle};
pub use static_corpus::StaticCorpusReader;
pub use threadpool::TPool;
