// Encoder availability of the local ffmpeg build

use std::collections::BTreeSet;
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

use tracing::debug;

use super::codec::{HardwareApi, VideoCodec};

/// Cache for the parsed output of `ffmpeg -encoders`.
static ENCODERS_CACHE: OnceLock<BTreeSet<String>> = OnceLock::new();

/// Encoder names `program` provides, cached for the process. The first
/// call decides which binary fills the cache.
pub fn available_encoders_with(program: &str) -> &'static BTreeSet<String> {
    ENCODERS_CACHE.get_or_init(|| {
        let output = Command::new(program)
            .args(["-hide_banner", "-encoders"])
            .output()
            .ok()
            .map(|o| String::from_utf8_lossy(&o.stdout).to_string())
            .unwrap_or_default();
        let encoders = parse_encoders(&output);
        debug!(program, count = encoders.len(), "encoder list loaded");
        encoders
    })
}

/// Parse `ffmpeg -encoders` output.
///
/// Encoder lines look like ` V....D libx264   libx264 H.264 ...`: a six
/// character capability field followed by the encoder name. Legend lines
/// (` V..... = Video`) and the `------` separator are skipped.
pub fn parse_encoders(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let flags = parts.next()?;
            let name = parts.next()?;
            let is_entry = flags.len() == 6
                && flags.starts_with(['V', 'A', 'S'])
                && name != "=";
            is_entry.then(|| name.to_string())
        })
        .collect()
}

/// Whether `codec` can run here: software and pseudo codecs always can,
/// hardware variants need the encoder compiled into ffmpeg.
pub fn codec_available(codec: VideoCodec, encoders: &BTreeSet<String>) -> bool {
    match codec {
        VideoCodec::Null | VideoCodec::Copy => true,
        _ => encoders.contains(codec.ffmpeg_name()),
    }
}

/// First VA-API render node (`/dev/dri/renderD*`), if any
pub fn detect_render_device() -> Option<String> {
    let dri_path = Path::new("/dev/dri");

    if !dri_path.exists() {
        return None;
    }

    let mut devices: Vec<_> = std::fs::read_dir(dri_path)
        .ok()?
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|n| n.starts_with("renderD"))
        })
        .map(|e| e.path())
        .collect();

    // Sort to get renderD128 before renderD129, etc.
    devices.sort();

    devices.first().map(|p| p.to_string_lossy().to_string())
}

/// Hardware APIs with at least one catalog encoder in `encoders`
pub fn available_apis(encoders: &BTreeSet<String>) -> Vec<HardwareApi> {
    let mut apis: Vec<HardwareApi> = Vec::new();
    for codec in VideoCodec::ALL {
        if codec.is_hardware()
            && encoders.contains(codec.ffmpeg_name())
            && !apis.contains(&codec.api())
        {
            apis.push(codec.api());
        }
    }
    apis
}
