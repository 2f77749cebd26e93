//! Conversion and integrity-check batches built on [`BatchRunner`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tracing::{debug, warn};

use super::backend::resolve_backend;
use super::batch::{BatchReport, BatchRunner, ErrorMode, FileContext, StepProgress};
use super::container::Container;
use super::core::{
    DurationProbe, EncodePlan, EncodeRequest, FileJob, STDERR_TAIL_LINES, assemble, check_args,
    run_ffmpeg, stderr_tail,
};
use super::error::{ConvertError, Result};
use super::settings::Settings;

/// Where and how a conversion batch writes its results
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Directory for outputs; `None` writes beside each input
    pub output_dir: Option<PathBuf>,
    /// Appended to each input's file stem
    pub out_stem: String,
    pub error_mode: ErrorMode,
    pub cancel: Option<Arc<AtomicBool>>,
}

/// Resolve the backend for `format` and validate the codec choice.
/// Runs once, before any file is looked at.
fn prepare_request(format: &str, request: &EncodeRequest) -> Result<EncodeRequest> {
    let target = resolve_backend(format)?;
    let mut request = request.clone();
    request.format = target.container;
    Container::resolve(request.format, request.audio_codec, request.video_codec)?;
    Ok(request)
}

fn runner(
    inputs: Vec<PathBuf>,
    request: &EncodeRequest,
    options: &ConvertOptions,
    settings: &Settings,
) -> BatchRunner {
    let runner = BatchRunner::new(
        inputs,
        options.output_dir.clone(),
        request.passes(),
        settings.overwrite,
    )
    .out_stem(options.out_stem.clone())
    .out_suffix(request.format.extension())
    .error_mode(options.error_mode);
    match &options.cancel {
        Some(flag) => runner.cancel_flag(Arc::clone(flag)),
        None => runner,
    }
}

/// Convert every input to `format`.
///
/// Each file gets one batch step per ffmpeg pass. `on_progress` receives the
/// aggregated batch percentage.
pub fn convert_batch(
    inputs: Vec<PathBuf>,
    format: &str,
    request: &EncodeRequest,
    options: &ConvertOptions,
    settings: &Settings,
    probe: &dyn DurationProbe,
    on_progress: impl FnMut(f64),
) -> Result<BatchReport> {
    let request = prepare_request(format, request)?;
    let runner = runner(inputs, &request, options, settings);

    runner.run(
        |ctx, progress| convert_file(ctx, progress, &request, settings, probe),
        on_progress,
    )
}

/// Result of the single probe made per file, replayed to [`assemble`]
struct ProbedDuration(anyhow::Result<f64>);

impl DurationProbe for ProbedDuration {
    fn duration(&self, _path: &Path) -> anyhow::Result<f64> {
        match &self.0 {
            Ok(d) => Ok(*d),
            Err(e) => Err(anyhow::anyhow!("{e:#}")),
        }
    }
}

fn convert_file(
    ctx: &FileContext,
    progress: &mut StepProgress<'_>,
    request: &EncodeRequest,
    settings: &Settings,
    probe: &dyn DurationProbe,
) -> Result<()> {
    let probed = ProbedDuration(probe.duration(&ctx.input));
    let plan = assemble(request, &ctx.input, &ctx.output, ctx.id, &probed, settings)?;

    // Outside target-size mode the duration only scales progress, so ffmpeg
    // still runs when probing fails
    let duration = match &probed.0 {
        Ok(d) => Some(*d),
        Err(e) => {
            debug!(input = %ctx.input.display(), error = %format!("{e:#}"), "duration unknown");
            None
        }
    };

    let passlog_dir = plan.passlog_prefix.as_deref().and_then(Path::parent);
    if let Some(dir) = passlog_dir {
        fs::create_dir_all(dir).map_err(|source| ConvertError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let result = run_passes(ctx, progress, &plan, settings, duration);

    if let Some(dir) = passlog_dir {
        if let Err(e) = fs::remove_dir_all(dir) {
            warn!(path = %dir.display(), error = %e, "could not remove two-pass log directory");
        }
    }

    result
}

fn run_passes(
    ctx: &FileContext,
    progress: &mut StepProgress<'_>,
    plan: &EncodePlan,
    settings: &Settings,
    duration: Option<f64>,
) -> Result<()> {
    for (i, args) in plan.passes.iter().enumerate() {
        let pass = i + 1;
        debug!(input = %ctx.input.display(), pass, of = plan.passes.len(), "running pass");
        run_ffmpeg(
            &settings.ffmpeg_bin,
            args,
            &ctx.input,
            pass,
            duration,
            &mut |pct| progress.set(pct),
        )?;
        progress.complete_step();
    }
    Ok(())
}

/// Assemble the commands a conversion would run, without running anything.
pub fn plan_batch(
    inputs: Vec<PathBuf>,
    format: &str,
    request: &EncodeRequest,
    options: &ConvertOptions,
    settings: &Settings,
    probe: &dyn DurationProbe,
) -> Result<Vec<(FileJob, EncodePlan)>> {
    let request = prepare_request(format, request)?;
    runner(inputs, &request, options, settings)
        .jobs()
        .into_iter()
        .map(|job| {
            let plan = assemble(
                &request,
                &job.input_path,
                &job.output_path,
                job.id,
                probe,
                settings,
            )?;
            Ok((job, plan))
        })
        .collect()
}

/// Decode every input fully and report the ones ffmpeg complains about.
///
/// Always continues past failures; the result is
/// [`ConvertError::BatchFailed`] when any file is damaged.
pub fn check_batch(
    inputs: Vec<PathBuf>,
    settings: &Settings,
    probe: &dyn DurationProbe,
    cancel: Option<Arc<AtomicBool>>,
    on_progress: impl FnMut(f64),
) -> Result<BatchReport> {
    let mut runner = BatchRunner::read_only(inputs).error_mode(ErrorMode::Continue);
    if let Some(flag) = cancel {
        runner = runner.cancel_flag(flag);
    }

    runner.run(
        |ctx, progress| {
            let duration = probe.duration(&ctx.input).ok();
            let outcome = run_ffmpeg(
                &settings.ffmpeg_bin,
                &check_args(&ctx.input),
                &ctx.input,
                1,
                duration,
                &mut |pct| progress.set(pct),
            )?;
            // ffmpeg exits 0 on many decode errors; `-v error` leaves only those on stderr
            if !outcome.stderr.trim().is_empty() {
                return Err(ConvertError::EngineFailed {
                    path: ctx.input.clone(),
                    pass: 1,
                    status: "decode errors reported".to_string(),
                    stderr: stderr_tail(outcome.stderr.trim(), STDERR_TAIL_LINES),
                });
            }
            Ok(())
        },
        on_progress,
    )
}
