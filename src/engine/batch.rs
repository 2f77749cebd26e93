//! Sequential batch driver.
//!
//! Files are processed one at a time in the order given. Each file runs a
//! caller-supplied worker for a fixed number of steps; progress reported by
//! the worker is folded into a single batch-wide percentage.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::core::{FileJob, JobStatus, derive_output_path, step_output_path};
use super::error::{ConvertError, Result};
use super::progress::ProgressManager;

/// What to do when one file of the batch fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Stop at the first failure and return its error
    #[default]
    FailFast,
    /// Record the failure, process the remaining files, and report
    /// [`ConvertError::BatchFailed`] at the end
    Continue,
}

/// The file a worker is asked to process
#[derive(Debug, Clone)]
pub struct FileContext {
    /// 0-based position in the batch
    pub index: usize,
    pub total: usize,
    pub id: Uuid,
    pub input: PathBuf,
    pub output: PathBuf,
    pub steps: usize,
}

impl FileContext {
    /// Intermediate output for `step`, removed when the file is done
    pub fn step_output(&self, step: usize) -> PathBuf {
        step_output_path(&self.output, step)
    }
}

/// Progress handle passed to a worker for the file it is processing
pub struct StepProgress<'a> {
    manager: &'a mut ProgressManager,
    sink: &'a mut dyn FnMut(f64),
}

impl<'a> StepProgress<'a> {
    fn new(manager: &'a mut ProgressManager, sink: &'a mut dyn FnMut(f64)) -> Self {
        Self { manager, sink }
    }

    /// Current 1-based step
    pub fn step(&self) -> usize {
        self.manager.step()
    }

    /// Report `pct` percent of the current step (clamped to 0..=100)
    pub fn set(&mut self, pct: f64) {
        if let Some(value) = self.manager.update(pct) {
            (self.sink)(value);
        }
    }

    /// Mark the current step as finished and move to the next one
    pub fn complete_step(&mut self) {
        if let Some(value) = self.manager.next_step() {
            (self.sink)(value);
        }
    }
}

/// Outcome of a batch that finished without an aborting error
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub jobs: Vec<FileJob>,
    /// Last value forwarded to the progress callback
    pub progress: Option<f64>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| j.status == JobStatus::Done)
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct BatchRunner {
    inputs: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    steps: usize,
    overwrite: bool,
    out_stem: String,
    out_suffix: Option<String>,
    error_mode: ErrorMode,
    cancel: Option<Arc<AtomicBool>>,
    writes_output: bool,
}

impl BatchRunner {
    pub fn new(
        inputs: Vec<PathBuf>,
        output_dir: Option<PathBuf>,
        steps: usize,
        overwrite: bool,
    ) -> Self {
        Self {
            inputs,
            output_dir,
            steps: steps.max(1),
            overwrite,
            out_stem: String::new(),
            out_suffix: None,
            error_mode: ErrorMode::FailFast,
            cancel: None,
            writes_output: true,
        }
    }

    /// Runner for workers that only read their input (integrity checks).
    /// Output paths are still derived but never validated or created.
    pub fn read_only(inputs: Vec<PathBuf>) -> Self {
        Self {
            writes_output: false,
            ..Self::new(inputs, None, 1, false)
        }
    }

    /// Text appended to each input's file stem
    pub fn out_stem(mut self, stem: impl Into<String>) -> Self {
        self.out_stem = stem.into();
        self
    }

    /// Output extension, with or without the leading dot
    pub fn out_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.out_suffix = Some(suffix.into());
        self
    }

    pub fn error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Flag checked between files; once set, the batch stops with
    /// [`ConvertError::Cancelled`]
    pub fn cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Planned jobs, one per input, in processing order
    pub fn jobs(&self) -> Vec<FileJob> {
        self.inputs
            .iter()
            .map(|input| {
                let output = derive_output_path(
                    input,
                    self.output_dir.as_deref(),
                    &self.out_stem,
                    self.out_suffix.as_deref(),
                );
                let mut job = FileJob::new(input.clone(), output, self.steps);
                job.overwrite = self.overwrite;
                job
            })
            .collect()
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Process every file with `worker`, forwarding aggregated progress to
    /// `on_progress`.
    ///
    /// The forwarded values never decrease and reach exactly 100 only when
    /// every file succeeded.
    pub fn run<W, P>(&self, mut worker: W, mut on_progress: P) -> Result<BatchReport>
    where
        W: FnMut(&FileContext, &mut StepProgress<'_>) -> Result<()>,
        P: FnMut(f64),
    {
        let mut jobs = self.jobs();
        let total = jobs.len();
        let mut manager = ProgressManager::new(total, self.steps);
        let mut failed = 0;

        info!(files = total, steps = self.steps, "starting batch");

        for (index, job) in jobs.iter_mut().enumerate() {
            if self.is_cancelled() {
                warn!(done = index, total, "batch cancelled");
                return Err(ConvertError::Cancelled);
            }

            let ctx = FileContext {
                index,
                total,
                id: job.id,
                input: job.input_path.clone(),
                output: job.output_path.clone(),
                steps: job.steps,
            };

            job.status = JobStatus::Running;
            info!(
                file = index + 1,
                total,
                input = %ctx.input.display(),
                output = %ctx.output.display(),
                "processing"
            );

            let result = match self.prepare(job) {
                Ok(()) => {
                    let mut progress = StepProgress::new(&mut manager, &mut on_progress);
                    worker(&ctx, &mut progress)
                }
                Err(e) => Err(e),
            };

            if ctx.steps > 1 {
                remove_step_outputs(&ctx);
            }

            match result {
                Ok(()) => {
                    if let Some(value) = manager.finish_file() {
                        on_progress(value);
                    }
                    job.status = JobStatus::Done;
                    job.progress_pct = 100.0;
                    info!(input = %ctx.input.display(), "done");
                }
                Err(e) => {
                    manager.fail_file();
                    job.status = JobStatus::Failed;
                    job.last_error = Some(e.to_string());
                    error!(input = %ctx.input.display(), error = %e, "file failed");
                    match self.error_mode {
                        ErrorMode::FailFast => return Err(e),
                        ErrorMode::Continue => failed += 1,
                    }
                }
            }
        }

        if failed > 0 {
            return Err(ConvertError::BatchFailed { failed, total });
        }

        info!(files = total, "batch finished");
        Ok(BatchReport {
            jobs,
            progress: manager.last(),
        })
    }

    /// Checks that must pass before the worker touches a file
    fn prepare(&self, job: &FileJob) -> Result<()> {
        if !job.input_path.exists() {
            return Err(ConvertError::InputNotFound {
                path: job.input_path.clone(),
            });
        }
        if !self.writes_output {
            return Ok(());
        }
        if same_file(&job.input_path, &job.output_path) {
            return Err(ConvertError::SameInputOutput {
                path: job.input_path.clone(),
            });
        }
        if job.output_path.exists() && !job.overwrite {
            return Err(ConvertError::OutputExists {
                path: job.output_path.clone(),
            });
        }
        if let Some(parent) = job
            .output_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            fs::create_dir_all(parent).map_err(|source| ConvertError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn remove_step_outputs(ctx: &FileContext) {
    for step in 1..=ctx.steps {
        let path = ctx.step_output(step);
        if path.exists() {
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed step output"),
                Err(e) => warn!(path = %path.display(), error = %e, "could not remove step output"),
            }
        }
    }
}
