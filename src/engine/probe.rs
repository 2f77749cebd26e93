// Input probing using ffprobe

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamInfo {
    pub index: u32,
    pub codec_type: String,
    pub codec_name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    pub sample_rate: Option<u32>,
    pub channels: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaInfo {
    pub format_name: Option<String>,
    pub duration: Option<f64>,
    pub bit_rate: Option<u64>,
    pub streams: Vec<StreamInfo>,
}

impl MediaInfo {
    pub fn has_video(&self) -> bool {
        self.streams.iter().any(|s| s.codec_type == "video")
    }

    pub fn has_audio(&self) -> bool {
        self.streams.iter().any(|s| s.codec_type == "audio")
    }
}

#[derive(Debug, Deserialize)]
struct RawStream {
    index: u32,
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct RawFormat {
    format_name: Option<String>,
    duration: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawProbe {
    #[serde(default)]
    streams: Vec<RawStream>,
    #[serde(default)]
    format: RawFormat,
}

/// Probe an input file's container and streams
pub fn probe_media_info(program: &str, input_path: &Path) -> Result<MediaInfo> {
    let output = Command::new(program)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(input_path)
        .output()
        .with_context(|| format!("Failed to run {program}"))?;

    if !output.status.success() {
        anyhow::bail!(
            "ffprobe failed for {}: {}",
            input_path.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }

    parse_media_info(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `ffprobe -show_format -show_streams` JSON
pub fn parse_media_info(json: &str) -> Result<MediaInfo> {
    let raw: RawProbe = serde_json::from_str(json).context("Failed to parse ffprobe JSON")?;

    let streams = raw
        .streams
        .into_iter()
        .map(|s| StreamInfo {
            index: s.index,
            codec_type: s.codec_type.unwrap_or_else(|| "unknown".to_string()),
            codec_name: s.codec_name,
            width: s.width,
            height: s.height,
            // r_frame_rate is more accurate; avg_frame_rate is the fallback
            fps: s
                .r_frame_rate
                .as_deref()
                .and_then(parse_fraction)
                .or_else(|| s.avg_frame_rate.as_deref().and_then(parse_fraction)),
            sample_rate: s.sample_rate.and_then(|r| r.parse().ok()),
            channels: s.channels,
        })
        .collect();

    Ok(MediaInfo {
        format_name: raw.format.format_name,
        duration: raw.format.duration.and_then(|d| d.parse().ok()),
        bit_rate: raw.format.bit_rate.and_then(|b| b.parse().ok()),
        streams,
    })
}

/// Parse a fraction string like "30000/1001" to f64
fn parse_fraction(s: &str) -> Option<f64> {
    let (numerator, denominator) = s.split_once('/')?;
    let numerator: f64 = numerator.parse().ok()?;
    let denominator: f64 = denominator.parse().ok()?;

    if denominator == 0.0 {
        return None;
    }

    Some(numerator / denominator)
}
