use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;
use uuid::Uuid;

use super::ffmpeg_info::DurationProbe;
use super::types::ProgressParser;
use crate::engine::codec::{
    AudioCodec, EncodingSpeed, Preset, ProfileLevel, QualityLevel, VideoCodec,
};
use crate::engine::container::{Container, ContainerFormat};
use crate::engine::error::{ConvertError, Result};
use crate::engine::filter::Filter;
use crate::engine::settings::{BitrateSplit, Settings};

/// Lines of ffmpeg stderr kept in a failure report
pub const STDERR_TAIL_LINES: usize = 20;

/// Everything the user asked for, independent of any particular file
#[derive(Debug, Clone)]
pub struct EncodeRequest {
    pub format: ContainerFormat,
    pub audio_codec: Option<AudioCodec>,
    pub video_codec: Option<VideoCodec>,
    /// kbit/s; `Some(0)` leaves the bitrate to the encoder, negative values are
    /// ignored with a warning
    pub audio_bitrate: Option<i64>,
    pub video_bitrate: Option<i64>,
    pub audio_filters: Vec<Filter>,
    pub video_filters: Vec<Filter>,
    pub quality: Option<QualityLevel>,
    pub speed: Option<EncodingSpeed>,
    pub profile: Option<ProfileLevel>,
    /// Desired output size in bytes; 0 disables target-size mode
    pub target_size: u64,
    /// Extra ffmpeg output options, shell-quoted
    pub extra_args: String,
}

impl Default for EncodeRequest {
    fn default() -> Self {
        Self {
            format: ContainerFormat::Mp4,
            audio_codec: None,
            video_codec: None,
            audio_bitrate: None,
            video_bitrate: None,
            audio_filters: Vec::new(),
            video_filters: Vec::new(),
            quality: None,
            speed: None,
            profile: None,
            target_size: 0,
            extra_args: String::new(),
        }
    }
}

impl EncodeRequest {
    pub fn new(format: ContainerFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    /// Whether this request will produce a two-pass plan
    pub fn expects_two_pass(&self) -> bool {
        self.target_size > 0
            || self.audio_bitrate.is_some_and(|b| b > 0)
            || self.video_bitrate.is_some_and(|b| b > 0)
    }

    /// Number of engine passes per file
    pub fn passes(&self) -> usize {
        if self.expects_two_pass() { 2 } else { 1 }
    }

    fn presets(&self) -> Vec<Preset> {
        let mut presets = Vec::new();
        if let Some(q) = self.quality {
            presets.push(Preset::Quality(q));
        }
        if let Some(s) = self.speed {
            presets.push(Preset::Speed(s));
        }
        if let Some(p) = self.profile {
            presets.push(Preset::Profile(p));
        }
        presets
    }
}

/// Assembled argument lists for one file, in execution order
#[derive(Debug, Clone, PartialEq)]
pub struct EncodePlan {
    pub passes: Vec<Vec<String>>,
    pub audio_kbps: u32,
    pub video_kbps: u32,
    /// Prefix for ffmpeg's two-pass statistics, when two passes are used
    pub passlog_prefix: Option<PathBuf>,
}

impl EncodePlan {
    pub fn is_two_pass(&self) -> bool {
        self.passes.len() == 2
    }
}

/// Parse a size like `100M`, `1.5G`, `700K` or `0` into bytes (1024-based).
pub fn parse_target_size(text: &str) -> Result<u64> {
    let text = text.trim();
    let invalid = |reason: &str| ConvertError::invalid_option("target size", format!("'{text}': {reason}"));
    if text == "0" {
        return Ok(0);
    }
    let (number, multiplier) = match text.chars().last().map(|c| c.to_ascii_uppercase()) {
        Some('K') => (&text[..text.len() - 1], 1024.0),
        Some('M') => (&text[..text.len() - 1], 1024.0 * 1024.0),
        Some('G') => (&text[..text.len() - 1], 1024.0 * 1024.0 * 1024.0),
        _ => return Err(invalid("expected <size>K, <size>M, <size>G or 0")),
    };
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| invalid("size is not a number"))?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid("size must not be negative"));
    }
    Ok((value * multiplier) as u64)
}

/// Split a target size into (audio, video) kbit/s for a file of `duration_s`.
pub fn target_bitrates(
    path: &Path,
    target_bytes: u64,
    duration_s: f64,
    requested_audio: Option<i64>,
    split: BitrateSplit,
) -> Result<(i64, i64)> {
    if !duration_s.is_finite() || duration_s <= 0.0 {
        return Err(ConvertError::TargetSizeUnresolvable {
            path: path.to_path_buf(),
            reason: format!("invalid duration {duration_s}"),
        });
    }

    let total_kbit = (target_bytes as f64 * 8.0 / 1024.0) as i64;
    let total_kbps = (total_kbit as f64 / duration_s) as i64;

    let requested = requested_audio.filter(|b| *b > 0);
    let audio = match split {
        BitrateSplit::FixedAudio { kbps } => requested.unwrap_or(i64::from(kbps)),
        BitrateSplit::Ratio { audio } => {
            requested.unwrap_or_else(|| ((total_kbps as f64) * audio.clamp(0.0, 1.0)) as i64)
        }
    };
    let video = total_kbps - audio;

    if video < 1 {
        let audio_mb = audio as f64 / 8.0 * duration_s / 1024.0;
        return Err(ConvertError::TargetSizeTooSmall {
            path: path.to_path_buf(),
            minimum_mb: audio_mb + 0.1,
        });
    }

    debug!(
        path = %path.display(),
        total_kbps,
        audio_kbps = audio,
        video_kbps = video,
        "target size resolved"
    );
    Ok((audio, video))
}

/// Prefix for `-passlogfile`, unique per job
pub fn two_pass_log_prefix(job_id: Uuid) -> PathBuf {
    std::env::temp_dir()
        .join("ffbatch_2pass")
        .join(job_id.to_string())
        .join("ffmpeg2pass")
}

/// Output target that discards the first pass
pub fn null_target() -> &'static str {
    if cfg!(windows) { "NUL" } else { "/dev/null" }
}

/// Split user-supplied ffmpeg options shell-style
pub fn split_extra_args(extra: &str) -> Vec<String> {
    if extra.trim().is_empty() {
        return Vec::new();
    }
    // Use shlex for shell-style parsing (respects quotes)
    shlex::split(extra).unwrap_or_else(|| {
        // Unbalanced quotes: fall back to simple whitespace split
        extra.split_whitespace().map(str::to_string).collect()
    })
}

fn input_args(input: &Path, overwrite: bool, verbose: bool) -> Vec<String> {
    let mut args = vec![if overwrite { "-y" } else { "-n" }.to_string()];
    if verbose {
        // Shows up in the stderr tail of a failed pass
        args.extend(["-v".to_string(), "verbose".to_string()]);
    }
    args.extend([
        "-progress".to_string(),
        "-".to_string(),
        "-nostats".to_string(),
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
    ]);
    args
}

/// Build the argument lists that convert `input` into `output`.
///
/// Codec descriptors are fresh catalog copies, so nothing here leaks between
/// files. Two passes are produced exactly when the resolved audio or video
/// bitrate is positive.
pub fn assemble(
    request: &EncodeRequest,
    input: &Path,
    output: &Path,
    job_id: Uuid,
    probe: &dyn DurationProbe,
    settings: &Settings,
) -> Result<EncodePlan> {
    let mut container =
        Container::resolve(request.format, request.audio_codec, request.video_codec)?;

    for preset in request.presets() {
        container.video_mut().apply_preset(preset);
    }

    let (audio_bitrate, video_bitrate) = if request.target_size > 0 {
        let duration = probe
            .duration(input)
            .map_err(|e| ConvertError::TargetSizeUnresolvable {
                path: input.to_path_buf(),
                reason: format!("{e:#}"),
            })?;
        let (audio, video) = target_bitrates(
            input,
            request.target_size,
            duration,
            request.audio_bitrate,
            settings.bitrate_split,
        )?;
        (Some(audio), Some(video))
    } else {
        (request.audio_bitrate, request.video_bitrate)
    };

    // Zero leaves the bitrate to the encoder, including a preset's `-b:v 0`
    if let Some(kbps) = audio_bitrate.filter(|&kbps| kbps != 0) {
        container.audio_mut().set_bitrate(kbps);
    }
    if let Some(kbps) = video_bitrate.filter(|&kbps| kbps != 0) {
        container.video_mut().set_bitrate(kbps);
    }

    container.audio_mut().set_filters(&request.audio_filters);
    container.video_mut().set_filters(&request.video_filters);

    let extra = split_extra_args(&request.extra_args);
    let audio_kbps = container.audio().bitrate();
    let video_kbps = container.video().bitrate();
    let two_pass = audio_kbps > 0 || video_kbps > 0;

    let output_arg = output.to_string_lossy().into_owned();

    if !two_pass {
        let mut args = input_args(input, settings.overwrite, settings.verbose);
        args.extend(container.serialize());
        args.extend(extra);
        args.push(output_arg);
        debug!(input = %input.display(), args = ?args, "assembled single-pass command");
        return Ok(EncodePlan {
            passes: vec![args],
            audio_kbps,
            video_kbps,
            passlog_prefix: None,
        });
    }

    let prefix = two_pass_log_prefix(job_id);
    let prefix_arg = prefix.to_string_lossy().into_owned();

    // Pass 1 only gathers statistics. It always overwrites the null target.
    let mut pass1 = input_args(input, true, settings.verbose);
    pass1.extend(["-f".to_string(), "null".to_string()]);
    let video = container.video();
    if video.is_disabled() || video.is_copy() {
        // No encoded video to analyse: run the audio encoder instead of
        // producing an output without streams.
        pass1.extend(container.audio().serialize());
    } else {
        pass1.push("-an".to_string());
    }
    pass1.extend(video.serialize());
    pass1.extend([
        "-pass".to_string(),
        "1".to_string(),
        "-passlogfile".to_string(),
        prefix_arg.clone(),
    ]);
    pass1.extend(extra.iter().cloned());
    pass1.push(null_target().to_string());

    let mut pass2 = input_args(input, settings.overwrite, settings.verbose);
    pass2.extend(container.serialize());
    pass2.extend([
        "-pass".to_string(),
        "2".to_string(),
        "-passlogfile".to_string(),
        prefix_arg,
    ]);
    pass2.extend(extra);
    pass2.push(output_arg);

    debug!(
        input = %input.display(),
        pass1 = ?pass1,
        pass2 = ?pass2,
        "assembled two-pass commands"
    );

    Ok(EncodePlan {
        passes: vec![pass1, pass2],
        audio_kbps,
        video_kbps,
        passlog_prefix: Some(prefix),
    })
}

/// Decode the whole input and discard it, surfacing corrupt streams
pub fn check_args(input: &Path) -> Vec<String> {
    vec![
        "-v".to_string(),
        "error".to_string(),
        "-progress".to_string(),
        "-".to_string(),
        "-nostats".to_string(),
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
        "-f".to_string(),
        "null".to_string(),
        "-".to_string(),
    ]
}

/// Format a command as a shell-safe string for display
pub fn format_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .map(|arg| shlex::try_quote(arg).map_or_else(|_| arg.to_string(), |q| q.into_owned()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render every pass of a plan, chained the way a shell script would run them
pub fn format_plan(program: &str, plan: &EncodePlan) -> String {
    plan.passes
        .iter()
        .map(|args| format_command(program, args))
        .collect::<Vec<_>>()
        .join("\n&& \\\n")
}

/// Result of one finished engine pass
#[derive(Debug, Clone)]
pub struct PassOutcome {
    pub parser: ProgressParser,
    pub stderr: String,
}

/// Run one ffmpeg pass to completion.
///
/// `on_progress` receives the pass progress in percent for every
/// `-progress` block ffmpeg writes. A non-zero exit becomes
/// [`ConvertError::EngineFailed`] carrying the tail of stderr.
pub fn run_ffmpeg(
    program: &str,
    args: &[String],
    input: &Path,
    pass: usize,
    duration_s: Option<f64>,
    on_progress: &mut dyn FnMut(f64),
) -> Result<PassOutcome> {
    let io_err = |source: std::io::Error| ConvertError::Io {
        path: input.to_path_buf(),
        source,
    };

    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn().map_err(|source| ConvertError::EngineSpawn {
        program: program.to_string(),
        source,
    })?;

    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io_err(std::io::Error::other("failed to capture stderr")))?;
    let stderr_thread = std::thread::spawn(move || {
        let mut stderr_output = String::new();
        let reader = BufReader::new(stderr);
        for line in reader.lines().map_while(std::result::Result::ok) {
            stderr_output.push_str(&line);
            stderr_output.push('\n');
        }
        stderr_output
    });

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io_err(std::io::Error::other("failed to capture stdout")))?;
    let reader = BufReader::new(stdout);
    let mut parser = ProgressParser::new();

    for line in reader.lines().map_while(std::result::Result::ok) {
        parser.parse_line(&line);
        // Each progress block ends with a `progress=` line
        if line.starts_with("progress=") {
            on_progress(parser.progress_pct(duration_s));
        }
    }

    let status = child.wait().map_err(io_err)?;

    let stderr_output = stderr_thread
        .join()
        .unwrap_or_else(|_| "Failed to capture stderr".to_string());

    if !status.success() {
        return Err(ConvertError::EngineFailed {
            path: input.to_path_buf(),
            pass,
            status: status.to_string(),
            stderr: stderr_tail(&stderr_output, STDERR_TAIL_LINES),
        });
    }

    Ok(PassOutcome {
        parser,
        stderr: stderr_output,
    })
}

/// Last `lines` lines of captured stderr
pub fn stderr_tail(stderr: &str, lines: usize) -> String {
    let all: Vec<&str> = stderr.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n")
}
