//! Batch Conversion Engine
//!
//! Fans one independent job per input file across a bounded rayon pool,
//! collects exactly one outcome per job in a slot arena, and produces a
//! single terminal report once every slot is filled.
//!
//! Shared state during a batch is deliberately small: a result slot per
//! job (each written once by its owning worker, read by the aggregator
//! only after the pool barrier) and one atomic completed-counter.

use crate::convert;
use crate::errors::EngineError;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{info, warn};

/// Worker-pool bounds: at least 2 workers even on constrained hosts, at
/// most 4 to bound the memory held by simultaneously decoded images.
pub const MIN_WORKERS: usize = 2;
pub const MAX_WORKERS: usize = 4;

/// Worker count for a batch: host parallelism clamped to [2, 4].
pub fn concurrency_degree() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(MIN_WORKERS)
        .clamp(MIN_WORKERS, MAX_WORKERS)
}

/// Progress sink: called with `(completed, total)` after each executed job.
pub type ProgressSink = dyn Fn(usize, usize) + Sync;

/// Conversion capability the engine fans out over: `(input, output)`.
pub type ConvertFn = dyn Fn(&Path, &Path) -> crate::errors::Result<()> + Sync;

/// Cooperative cancellation flag, checked between job dequeue and start.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
struct ConversionJob {
    index: usize,
    input: PathBuf,
    output: PathBuf,
}

#[derive(Debug)]
enum JobOutcome {
    Converted,
    Failed(PathBuf),
    /// Job was still queued when the batch was cancelled.
    NotStarted,
}

/// Terminal aggregate of one batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub converted: usize,
    /// Failed input paths, in job-submission order.
    pub failed: Vec<PathBuf>,
    /// Jobs skipped because the batch was cancelled before they started.
    pub not_started: usize,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub enum BatchOutcome {
    Completed(BatchReport),
    Cancelled(BatchReport),
}

impl BatchOutcome {
    pub fn report(&self) -> &BatchReport {
        match self {
            BatchOutcome::Completed(report) | BatchOutcome::Cancelled(report) => report,
        }
    }

    pub fn was_cancelled(&self) -> bool {
        matches!(self, BatchOutcome::Cancelled(_))
    }
}

/// Resolve output paths up front, in submission order.
///
/// Two inputs with the same base name would otherwise race for one flat
/// output path; the later one gets a `_1`, `_2`, … suffix instead of
/// silently overwriting.
fn plan_jobs(files: &[PathBuf], output_dir: &Path) -> Vec<ConversionJob> {
    let mut claimed: HashSet<String> = HashSet::with_capacity(files.len());

    files
        .iter()
        .enumerate()
        .map(|(index, input)| {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("image_{}", index));

            let mut name = format!("{}.png", stem);
            let mut suffix = 1;
            while !claimed.insert(name.clone()) {
                name = format!("{}_{}.png", stem, suffix);
                suffix += 1;
            }

            ConversionJob {
                index,
                input: input.clone(),
                output: output_dir.join(name),
            }
        })
        .collect()
}

/// One engine instance runs one batch at a time: `Idle → Running →
/// Completed`, re-arming to `Idle` so a failed subset can be re-run.
#[derive(Debug, Default)]
pub struct Engine {
    running: AtomicBool,
}

struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert `files` into `output_dir` with the real HEIC converter.
    ///
    /// `output_dir` must already exist; creating it is the caller's job.
    pub fn run_batch(
        &self,
        files: &[PathBuf],
        output_dir: &Path,
        progress: &ProgressSink,
        cancel: &CancelToken,
    ) -> Result<BatchOutcome, EngineError> {
        self.run_batch_with(files, output_dir, &convert::convert_heic_to_png, progress, cancel)
    }

    /// Like [`run_batch`](Self::run_batch) with the conversion capability
    /// injected.
    pub fn run_batch_with(
        &self,
        files: &[PathBuf],
        output_dir: &Path,
        convert: &ConvertFn,
        progress: &ProgressSink,
        cancel: &CancelToken,
    ) -> Result<BatchOutcome, EngineError> {
        if files.is_empty() {
            return Err(EngineError::EmptyBatch);
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngineError::BatchInProgress);
        }
        let _guard = RunningGuard(&self.running);

        let jobs = plan_jobs(files, output_dir);
        let total = jobs.len();
        let slots: Vec<OnceLock<JobOutcome>> = (0..total).map(|_| OnceLock::new()).collect();
        let completed = AtomicUsize::new(0);
        // Counter bump and sink call happen under one lock so events leave
        // in counter order.
        let emit_gate = Mutex::new(());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(concurrency_degree())
            .build()
            .or_else(|_| rayon::ThreadPoolBuilder::new().num_threads(MIN_WORKERS).build())
            .map_err(|e| EngineError::PoolBuild(e.to_string()))?;

        info!(
            total,
            workers = pool.current_num_threads(),
            output_dir = %output_dir.display(),
            "batch started"
        );

        pool.install(|| {
            jobs.par_iter().for_each(|job| {
                let outcome = if cancel.is_cancelled() {
                    JobOutcome::NotStarted
                } else {
                    match convert(&job.input, &job.output) {
                        Ok(()) => JobOutcome::Converted,
                        Err(e) => {
                            warn!(input = %job.input.display(), error = %e, "conversion failed");
                            JobOutcome::Failed(job.input.clone())
                        }
                    }
                };

                let executed = !matches!(outcome, JobOutcome::NotStarted);
                slots[job.index]
                    .set(outcome)
                    .expect("job outcome written twice");

                if executed {
                    let _emit = emit_gate.lock().unwrap_or_else(|e| e.into_inner());
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress(done, total);
                }
            });
        });

        // The pool barrier above guarantees every slot is filled.
        let mut report = BatchReport {
            total,
            converted: 0,
            failed: Vec::new(),
            not_started: 0,
            output_dir: output_dir.to_path_buf(),
        };
        for slot in &slots {
            match slot.get().expect("job finished without an outcome") {
                JobOutcome::Converted => report.converted += 1,
                JobOutcome::Failed(path) => report.failed.push(path.clone()),
                JobOutcome::NotStarted => report.not_started += 1,
            }
        }

        info!(
            converted = report.converted,
            failed = report.failed.len(),
            not_started = report.not_started,
            "batch finished"
        );

        if report.not_started > 0 {
            Ok(BatchOutcome::Cancelled(report))
        } else {
            Ok(BatchOutcome::Completed(report))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    fn ok_convert(_input: &Path, _output: &Path) -> crate::errors::Result<()> {
        Ok(())
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_concurrency_degree_bounds() {
        let degree = concurrency_degree();
        assert!((MIN_WORKERS..=MAX_WORKERS).contains(&degree));
    }

    #[test]
    fn test_empty_batch_rejected() {
        let engine = Engine::new();
        let result = engine.run_batch_with(
            &[],
            Path::new("/tmp/out"),
            &ok_convert,
            &|_, _| {},
            &CancelToken::new(),
        );
        assert!(matches!(result, Err(EngineError::EmptyBatch)));
    }

    #[test]
    fn test_mixed_batch_reports_failures_in_submission_order() {
        let engine = Engine::new();
        let files = paths(&[
            "/in/a.heic",
            "/in/bad1.heic",
            "/in/b.heic",
            "/in/bad2.heic",
            "/in/c.heic",
        ]);

        let convert = |input: &Path, _output: &Path| {
            if input.to_string_lossy().contains("bad") {
                Err(crate::errors::ConvertError::HeicDecode("corrupt".into()))
            } else {
                Ok(())
            }
        };

        let outcome = engine
            .run_batch_with(&files, Path::new("/tmp/out"), &convert, &|_, _| {}, &CancelToken::new())
            .unwrap();

        let report = outcome.report();
        assert!(!outcome.was_cancelled());
        assert_eq!(report.total, 5);
        assert_eq!(report.converted, 3);
        assert_eq!(report.failed, paths(&["/in/bad1.heic", "/in/bad2.heic"]));
        assert_eq!(report.not_started, 0);
    }

    #[test]
    fn test_progress_events_monotonic_and_complete() {
        let engine = Engine::new();
        let files: Vec<PathBuf> = (0..16).map(|i| PathBuf::from(format!("/in/{}.heic", i))).collect();

        let events: Mutex<Vec<(usize, usize)>> = Mutex::new(Vec::new());
        let outcome = engine
            .run_batch_with(
                &files,
                Path::new("/tmp/out"),
                &ok_convert,
                &|done, total| events.lock().unwrap().push((done, total)),
                &CancelToken::new(),
            )
            .unwrap();

        let events = events.into_inner().unwrap();
        let expected: Vec<(usize, usize)> = (1..=16).map(|i| (i, 16)).collect();
        assert_eq!(events, expected);
        assert_eq!(outcome.report().converted, 16);
    }

    #[test]
    fn test_concrete_scenario_one_corrupt_of_three() {
        let engine = Engine::new();
        let files = paths(&["/in/a.heic", "/in/b.heic", "/in/c.heic"]);

        let convert = |input: &Path, _output: &Path| {
            if input.ends_with("c.heic") {
                Err(crate::errors::ConvertError::HeicDecode("corrupt".into()))
            } else {
                Ok(())
            }
        };

        let events: Mutex<Vec<(usize, usize)>> = Mutex::new(Vec::new());
        let outcome = engine
            .run_batch_with(
                &files,
                Path::new("/tmp/out"),
                &convert,
                &|done, total| events.lock().unwrap().push((done, total)),
                &CancelToken::new(),
            )
            .unwrap();

        let report = outcome.report();
        assert_eq!(report.failed, paths(&["/in/c.heic"]));
        assert_eq!(report.converted, 2);
        assert_eq!(report.output_dir, PathBuf::from("/tmp/out"));

        let events = events.into_inner().unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events.last(), Some(&(3, 3)));
    }

    #[test]
    fn test_jobs_get_distinct_outputs_on_base_name_collision() {
        let jobs = plan_jobs(
            &paths(&["/one/img.heic", "/two/img.heic", "/three/img.heic", "/four/other.heic"]),
            Path::new("/out"),
        );

        assert_eq!(jobs[0].output, PathBuf::from("/out/img.png"));
        assert_eq!(jobs[1].output, PathBuf::from("/out/img_1.png"));
        assert_eq!(jobs[2].output, PathBuf::from("/out/img_2.png"));
        assert_eq!(jobs[3].output, PathBuf::from("/out/other.png"));
    }

    #[test]
    fn test_cancelled_before_start_reports_all_not_started() {
        let engine = Engine::new();
        let files = paths(&["/in/a.heic", "/in/b.heic"]);

        let cancel = CancelToken::new();
        cancel.cancel();

        let events: Mutex<Vec<(usize, usize)>> = Mutex::new(Vec::new());
        let outcome = engine
            .run_batch_with(
                &files,
                Path::new("/tmp/out"),
                &ok_convert,
                &|done, total| events.lock().unwrap().push((done, total)),
                &cancel,
            )
            .unwrap();

        assert!(outcome.was_cancelled());
        assert_eq!(outcome.report().not_started, 2);
        assert_eq!(outcome.report().converted, 0);
        assert!(events.into_inner().unwrap().is_empty());
    }

    #[test]
    fn test_second_batch_rejected_while_running() {
        let engine = Arc::new(Engine::new());
        let started = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));

        let worker_engine = Arc::clone(&engine);
        let worker_started = Arc::clone(&started);
        let worker_release = Arc::clone(&release);

        let handle = std::thread::spawn(move || {
            let convert = move |_: &Path, _: &Path| -> crate::errors::Result<()> {
                worker_started.wait();
                worker_release.wait();
                Ok(())
            };
            worker_engine.run_batch_with(
                &[PathBuf::from("/in/a.heic")],
                Path::new("/tmp/out"),
                &convert,
                &|_, _| {},
                &CancelToken::new(),
            )
        });

        started.wait();
        let second = engine.run_batch_with(
            &[PathBuf::from("/in/b.heic")],
            Path::new("/tmp/out"),
            &ok_convert,
            &|_, _| {},
            &CancelToken::new(),
        );
        assert!(matches!(second, Err(EngineError::BatchInProgress)));

        release.wait();
        let first = handle.join().unwrap().unwrap();
        assert_eq!(first.report().converted, 1);

        // engine is reusable once the first batch completed
        let third = engine.run_batch_with(
            &[PathBuf::from("/in/c.heic")],
            Path::new("/tmp/out"),
            &ok_convert,
            &|_, _| {},
            &CancelToken::new(),
        );
        assert!(third.is_ok());
    }
}
