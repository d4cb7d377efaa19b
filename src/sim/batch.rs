use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{DatagenError, Result};
use crate::sim::buffers::SampleBuffers;
use crate::sim::kernel::{FieldKernel, KernelFlags, KernelInput};
use crate::sim::results::{ResultAggregator, SampleFailure};
use crate::sim::sample::SampleLoader;
use crate::sim::survey::SurveyContext;

/// What the batch does when a single sample fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleErrorPolicy {
    /// Log the failure, record it in the summary and continue.
    #[default]
    Skip,
    /// Stop scheduling new samples and return the first failure.
    Abort,
}

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Samples `0..sample_count` are processed.
    pub sample_count: usize,
    pub flags: KernelFlags,
    /// Worker threads. 0 or 1 runs the batch on the calling thread.
    pub workers: usize,
    pub on_error: SampleErrorPolicy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            sample_count: 0,
            flags: KernelFlags::default(),
            workers: 1,
            on_error: SampleErrorPolicy::default(),
        }
    }
}

/// Cooperative cancellation flag shared between the caller and the batch.
///
/// Samples already in flight finish; no new sample starts after `cancel`.
#[derive(Debug, Clone, Default)]
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

/// Snapshot passed to progress callbacks.
#[derive(Debug, Clone, Copy)]
pub struct BatchProgress {
    /// Samples finished so far, failed ones included.
    pub samples_done: usize,
    pub sample_count: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

/// Outcome of a completed (or cancelled) batch.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub succeeded: usize,
    /// Skipped samples, ordered by index.
    pub failed: Vec<SampleFailure>,
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && !self.cancelled
    }
}

trait ProgressReporter: Sync {
    fn every_samples(&self) -> usize;
    fn report(&self, progress: &BatchProgress);
}

struct NoProgress;
impl ProgressReporter for NoProgress {
    fn every_samples(&self) -> usize {
        0
    }
    fn report(&self, _progress: &BatchProgress) {}
}

struct FnProgress<F> {
    every_samples: usize,
    f: F,
}
impl<F> ProgressReporter for FnProgress<F>
where
    F: Fn(&BatchProgress) + Sync,
{
    fn every_samples(&self) -> usize {
        self.every_samples
    }
    fn report(&self, progress: &BatchProgress) {
        (self.f)(progress);
    }
}

/// Bookkeeping shared by all workers of one run.
struct RunState<'r, R> {
    results: &'r ResultAggregator,
    cancel: &'r CancelToken,
    reporter: R,
    start: Instant,
    done: AtomicUsize,
    failures: Mutex<Vec<SampleFailure>>,
    aborted: AtomicBool,
    first_error: Mutex<Option<DatagenError>>,
}

impl<R: ProgressReporter> RunState<'_, R> {
    fn should_stop(&self) -> bool {
        self.cancel.is_cancelled() || self.aborted.load(Ordering::SeqCst)
    }

    fn failed_count(&self) -> usize {
        self.failures.lock().map(|f| f.len()).unwrap_or_default()
    }

    fn progress(&self, samples_done: usize, sample_count: usize) -> BatchProgress {
        BatchProgress {
            samples_done,
            sample_count,
            failed: self.failed_count(),
            elapsed: self.start.elapsed(),
        }
    }
}

/// Runs the per-sample pipeline over `0..sample_count`.
///
/// For each sample: load the four property arrays into a worker-owned
/// [`SampleBuffers`], scale susceptibility by the field magnitude in magnetic
/// mode, call the kernel and append the first `cell_count` values to the
/// aggregator. Survey geometry is shared read-only by all workers.
pub struct BatchOrchestrator<'a> {
    context: SurveyContext<'a>,
    kernel: &'a dyn FieldKernel,
    loader: &'a dyn SampleLoader,
    options: BatchOptions,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(
        context: SurveyContext<'a>,
        kernel: &'a dyn FieldKernel,
        loader: &'a dyn SampleLoader,
        options: BatchOptions,
    ) -> Self {
        Self {
            context,
            kernel,
            loader,
            options,
        }
    }

    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    pub fn run(&self, results: &ResultAggregator, cancel: &CancelToken) -> Result<BatchSummary> {
        self.run_inner(results, cancel, NoProgress)
    }

    /// Runs the batch while periodically reporting progress.
    ///
    /// - `every_samples=0` disables progress reporting.
    /// - The callback is called once at start (`samples_done=0`), then every
    ///   `every_samples` finished samples, plus once at the end.
    /// - With several workers the callback may run on any worker thread.
    pub fn run_with_progress<F>(
        &self,
        results: &ResultAggregator,
        cancel: &CancelToken,
        every_samples: usize,
        report: F,
    ) -> Result<BatchSummary>
    where
        F: Fn(&BatchProgress) + Sync,
    {
        let reporter = FnProgress {
            every_samples,
            f: report,
        };
        self.run_inner(results, cancel, reporter)
    }

    /// Processes one sample using the given buffers.
    ///
    /// Returns exactly `cell_count` migrated values.
    pub fn run_sample(&self, index: usize, buffers: &mut SampleBuffers) -> Result<Vec<f64>> {
        let mesh = self.context.mesh;
        let cell_count = mesh.cell_count();

        self.loader.load_into(index, buffers)?;
        if self.options.flags.magnetic {
            buffers.scale_susceptibility(self.context.field.magnitude());
        }

        let input = KernelInput {
            sample: index,
            susceptibility: &buffers.susceptibility,
            kx: &buffers.kx,
            ky: &buffers.ky,
            kz: &buffers.kz,
            flags: self.options.flags,
            direction: self.context.field.direction_cosines(),
            nodes: mesh.nodes(),
            cells: mesh.cells(),
            receivers: self.context.receivers.points(),
            centroids: self.context.geometry.centroids(),
            volumes: self.context.geometry.volumes(),
        };
        let kernel_error = |reason: String| DatagenError::Kernel {
            kernel: self.kernel.name().to_string(),
            sample: index,
            reason,
        };

        let mut values = self
            .kernel
            .compute_and_migrate(&input)
            .map_err(|e| kernel_error(format!("{e:#}")))?;
        if values.len() < cell_count {
            return Err(kernel_error(format!(
                "returned {} values for {cell_count} cells",
                values.len()
            )));
        }
        values.truncate(cell_count);
        Ok(values)
    }

    fn run_inner<R: ProgressReporter>(
        &self,
        results: &ResultAggregator,
        cancel: &CancelToken,
        reporter: R,
    ) -> Result<BatchSummary> {
        let sample_count = self.options.sample_count;
        let cell_count = self.context.mesh.cell_count();
        let workers = self.options.workers.max(1);
        info!(
            samples = sample_count,
            workers,
            kernel = self.kernel.name(),
            "Starting batch"
        );

        let state = RunState {
            results,
            cancel,
            reporter,
            start: Instant::now(),
            done: AtomicUsize::new(0),
            failures: Mutex::new(Vec::new()),
            aborted: AtomicBool::new(false),
            first_error: Mutex::new(None),
        };
        if state.reporter.every_samples() > 0 {
            state.reporter.report(&state.progress(0, sample_count));
        }

        if workers == 1 {
            let mut buffers = SampleBuffers::new(cell_count);
            for index in 0..sample_count {
                if state.should_stop() {
                    break;
                }
                self.process(index, &mut buffers, &state);
            }
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| DatagenError::WorkerPool {
                    workers,
                    reason: e.to_string(),
                })?;
            pool.install(|| {
                // One buffer set per rayon job split, never shared between samples in flight
                (0..sample_count).into_par_iter().for_each_init(
                    || SampleBuffers::new(cell_count),
                    |buffers, index| {
                        if !state.should_stop() {
                            self.process(index, buffers, &state);
                        }
                    },
                );
            });
        }

        let done = state.done.load(Ordering::SeqCst);
        if state.reporter.every_samples() > 0 {
            state.reporter.report(&state.progress(done, sample_count));
        }

        let first_error = state
            .first_error
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(err) = first_error {
            return Err(err);
        }

        let mut failed = state
            .failures
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        failed.sort_by_key(|f| f.sample);
        let summary = BatchSummary {
            succeeded: done - failed.len(),
            failed,
            cancelled: cancel.is_cancelled(),
            elapsed: state.start.elapsed(),
        };
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed.len(),
            cancelled = summary.cancelled,
            elapsed_s = summary.elapsed.as_secs_f64(),
            "Batch finished"
        );
        Ok(summary)
    }

    fn process<R: ProgressReporter>(
        &self,
        index: usize,
        buffers: &mut SampleBuffers,
        state: &RunState<'_, R>,
    ) {
        match self.run_sample(index, buffers) {
            Ok(values) => {
                debug!(sample = index, "sample done");
                state.results.append(index, values);
            }
            Err(err) => match self.options.on_error {
                SampleErrorPolicy::Skip => {
                    warn!(sample = index, error = %err, "sample failed, skipping");
                    if let Ok(mut failures) = state.failures.lock() {
                        failures.push(SampleFailure {
                            sample: index,
                            reason: err.to_string(),
                        });
                    }
                }
                SampleErrorPolicy::Abort => {
                    error!(sample = index, error = %err, "sample failed, aborting batch");
                    state.aborted.store(true, Ordering::SeqCst);
                    if let Ok(mut first) = state.first_error.lock()
                        && first.is_none()
                    {
                        *first = Some(err);
                    }
                }
            },
        }

        let done = state.done.fetch_add(1, Ordering::SeqCst) + 1;
        let every = state.reporter.every_samples();
        if every > 0 && done % every == 0 && done < self.options.sample_count {
            state
                .reporter
                .report(&state.progress(done, self.options.sample_count));
        }
    }
}
