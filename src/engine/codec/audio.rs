use std::fmt;
use std::str::FromStr;

use crate::engine::error::ConvertError;

/// Selectable audio encoders, including the stream-drop and passthrough members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCodec {
    Null,
    Copy,
    Aac,
    Ac3,
    Flac,
    Mp3,
    Opus,
    Vorbis,
    PcmS16le,
}

impl AudioCodec {
    pub const ALL: [AudioCodec; 9] = [
        Self::Null,
        Self::Copy,
        Self::Aac,
        Self::Ac3,
        Self::Flac,
        Self::Mp3,
        Self::Opus,
        Self::Vorbis,
        Self::PcmS16le,
    ];

    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Copy => "copy",
            Self::Aac => "aac",
            Self::Ac3 => "ac3",
            Self::Flac => "flac",
            Self::Mp3 => "libmp3lame",
            Self::Opus => "libopus",
            Self::Vorbis => "libvorbis",
            Self::PcmS16le => "pcm_s16le",
        }
    }
}

impl fmt::Display for AudioCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ffmpeg_name())
    }
}

impl FromStr for AudioCodec {
    type Err = ConvertError;

    /// Accepts the encoder name or the common short alias (`mp3`, `opus`, `vorbis`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let alias = match wanted.as_str() {
            "mp3" => Some(Self::Mp3),
            "opus" => Some(Self::Opus),
            "vorbis" => Some(Self::Vorbis),
            _ => None,
        };
        alias
            .or_else(|| Self::ALL.into_iter().find(|c| c.ffmpeg_name() == wanted))
            .ok_or_else(|| {
                ConvertError::invalid_option(
                    "audio codec",
                    format!(
                        "unknown encoder '{s}' (known: {})",
                        Self::ALL.map(|c| c.ffmpeg_name()).join(", ")
                    ),
                )
            })
    }
}
