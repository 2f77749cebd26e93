use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

/// Source of input durations, needed to turn a target size into bitrates
pub trait DurationProbe {
    fn duration(&self, path: &Path) -> Result<f64>;
}

/// Reads durations with the ffprobe binary
#[derive(Debug, Clone)]
pub struct Ffprobe {
    program: String,
}

impl Ffprobe {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Ffprobe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

impl DurationProbe for Ffprobe {
    fn duration(&self, path: &Path) -> Result<f64> {
        probe_duration_with(&self.program, path)
    }
}

/// Same duration for every file; used for dry runs and tests
#[derive(Debug, Clone, Copy)]
pub struct FixedDuration(pub f64);

impl DurationProbe for FixedDuration {
    fn duration(&self, _path: &Path) -> Result<f64> {
        Ok(self.0)
    }
}

fn tool_version(program: &str) -> Result<String> {
    let output = Command::new(program)
        .arg("-version")
        .output()
        .with_context(|| format!("Failed to execute {program}. Is it installed and in PATH?"))?;

    if !output.status.success() {
        anyhow::bail!("{} command failed with status: {}", program, output.status);
    }

    let version_output = String::from_utf8_lossy(&output.stdout);
    let first_line = version_output.lines().next().unwrap_or("Unknown version");

    Ok(first_line.to_string())
}

/// Check if ffmpeg is available and return its version
pub fn ffmpeg_version(program: &str) -> Result<String> {
    tool_version(program)
}

/// Check if ffprobe is available
pub fn ffprobe_version(program: &str) -> Result<String> {
    tool_version(program)
}

/// Probe a media file to get its duration in seconds
pub fn probe_duration(path: &Path) -> Result<f64> {
    probe_duration_with("ffprobe", path)
}

fn probe_duration_with(program: &str, path: &Path) -> Result<f64> {
    let output = Command::new(program)
        .arg("-v")
        .arg("quiet")
        .arg("-print_format")
        .arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .with_context(|| format!("Failed to execute {program}"))?;

    if !output.status.success() {
        anyhow::bail!(
            "ffprobe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }

    parse_ffprobe_duration(&String::from_utf8_lossy(&output.stdout))
}

/// Parse duration from ffprobe JSON string
pub fn parse_ffprobe_duration(json: &str) -> Result<f64> {
    let probe: FfprobeOutput =
        serde_json::from_str(json).context("Failed to parse ffprobe JSON")?;

    let duration_str = probe.format.duration.context("No duration found in JSON")?;

    duration_str
        .parse::<f64>()
        .context("Failed to parse duration as float")
}
