//! Demo harness binary exercising the corpus engine end to end: spawns a
//! pool of worker threads sharing one `DynamicCorpus` and one
//! `StaticCorpusReader`, each replaying static inputs through the dry-run
//! geometric-growth walk and inserting entries into the dynamic corpus
//! when given a coverage vector larger than the current tail.
//!
//! This binary has no target program of its own; it exists to drive the
//! library's concurrency model under a real thread pool and is the
//! reference consumer the integration tests also model themselves on.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use clap::Parser;

use corpus_engine::{
    AtomicPhaseOracle, CommandRunner, Config, CoverageVector, DynamicBuffer, DynamicCorpus,
    InputPreparer, NoopMangler, Phase, PhaseOracle, StaticCorpusReader, TPool, WorkerState,
};

#[derive(Debug, Parser)]
#[command(name = "corpus-engine-harness", about = "Drives the corpus engine against a directory of seed files")]
struct Args {
    /// Directory of seed files to read as the static corpus.
    #[arg(long)]
    input_dir: PathBuf,

    /// Directory newly inserted dynamic corpus entries are written to.
    /// Defaults to `input_dir`.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Number of worker threads. Defaults to the number of logical cores.
    #[arg(long)]
    workers: Option<usize>,

    /// Number of dry-run passes each worker performs before exiting.
    #[arg(long, default_value_t = 4)]
    passes: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let nb_workers = args.workers.unwrap_or_else(corpus_engine::util::count_cores);

    let mut config = Config::new(&args.input_dir);
    config.output_dir = args.output_dir;

    let scr = Arc::new(StaticCorpusReader::init(&args.input_dir, 0)?);
    let dc = Arc::new(DynamicCorpus::new());
    let phase_oracle = Arc::new(AtomicPhaseOracle::new(Phase::DryRun));

    corpus_engine::notify::set_level(corpus_engine::notify::LEVEL_INFO);
    corpus_engine::info!(
        "harness: {} seed file(s) in {}, {} worker(s), maxInputSz={}",
        scr.count(),
        args.input_dir.display(),
        nb_workers,
        scr.max_input_sz()
    );

    let pool = TPool::new(nb_workers, nb_workers * 4).expect("thread pool creation failed");
    let accepted = Arc::new(AtomicU64::new(0));

    for worker_id in 0..nb_workers {
        let scr = Arc::clone(&scr);
        let dc = Arc::clone(&dc);
        let phase_oracle = Arc::clone(&phase_oracle);
        let config = config.clone();
        let accepted = Arc::clone(&accepted);
        let passes = args.passes;

        pool.submit_job(Box::new(move || {
            run_worker(worker_id, scr, dc, phase_oracle, config, passes, accepted);
        }));
    }

    pool.jobs_completed();

    corpus_engine::info!(
        "harness: done. {} entries now in the dynamic corpus, {} accepted this run",
        dc.count(),
        accepted.load(Ordering::SeqCst)
    );
    Ok(())
}

fn run_worker(
    worker_id: usize,
    scr: Arc<StaticCorpusReader>,
    dc: Arc<DynamicCorpus>,
    phase_oracle: Arc<AtomicPhaseOracle>,
    config: Config,
    passes: usize,
    accepted: Arc<AtomicU64>,
) {
    let ip = InputPreparer::new(
        Arc::clone(&scr),
        Arc::clone(&dc),
        NoopMangler,
        CommandRunner,
        AtomicAdapter(Arc::clone(&phase_oracle)),
        config.clone(),
    );
    let mut buffer = DynamicBuffer::new(scr.max_input_sz().max(1024)).expect("buffer allocation failed");
    let mut worker_state = WorkerState::new();

    // Rewinding lets the round-robin reader cycle back to the first file
    // once exhausted, so `passes` multiplies coverage of the same seed set
    // through repeated geometric-growth walks.
    let total_reads = passes * scr.count().max(1);
    for _ in 0..total_reads {
        if phase_oracle.terminating() {
            return;
        }
        match ip.prepare_static_file(&mut worker_state, &mut buffer, true, false) {
            Some(()) => {
                let cov = synthetic_coverage(buffer.filled());
                dc.add_dynamic_input(
                    buffer.filled(),
                    cov,
                    format!("worker-{worker_id}"),
                    phase_oracle.phase(),
                    &config,
                );
                accepted.fetch_add(1, Ordering::SeqCst);
            }
            None => break,
        }
    }
}

/// Wraps `Arc<AtomicPhaseOracle>` so it can itself implement `PhaseOracle`,
/// since the trait isn't implemented for `Arc<T>` blanket-style.
struct AtomicAdapter(Arc<AtomicPhaseOracle>);

impl PhaseOracle for AtomicAdapter {
    fn phase(&self) -> Phase {
        self.0.phase()
    }

    fn terminating(&self) -> bool {
        self.0.terminating()
    }
}

/// Derives a stand-in coverage vector from the bytes read, since this
/// harness has no instrumented target to report real coverage. Longer,
/// more varied inputs score higher, which is enough to exercise insertion
/// ordering without a real fuzzing target.
fn synthetic_coverage(data: &[u8]) -> CoverageVector {
    let distinct_bytes = {
        let mut seen = [false; 256];
        let mut count = 0u64;
        for &b in data {
            if !seen[b as usize] {
                seen[b as usize] = true;
                count += 1;
            }
        }
        count
    };
    CoverageVector::new(distinct_bytes, data.len() as u64, 0, 0)
}
