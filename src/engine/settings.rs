//! Run-wide settings handed explicitly to every batch run.

use serde::{Deserialize, Serialize};

/// How a target output size is divided between audio and video
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BitrateSplit {
    /// Audio keeps a fixed bitrate (or the one requested); video gets the rest
    FixedAudio { kbps: u32 },
    /// Audio gets this fraction of the total unless a bitrate was requested
    Ratio { audio: f64 },
}

impl Default for BitrateSplit {
    fn default() -> Self {
        Self::FixedAudio { kbps: 128 }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
    pub overwrite: bool,
    pub bitrate_split: BitrateSplit,
    /// Print a live progress line on stdout
    pub show_progress: bool,
    /// Run ffmpeg with `-v verbose`
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
            overwrite: false,
            bitrate_split: BitrateSplit::default(),
            show_progress: false,
            verbose: false,
        }
    }
}
