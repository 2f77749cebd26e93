use std::fmt;
use std::str::FromStr;

use crate::engine::error::ConvertError;

/// Compression standard a video encoder produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoStandard {
    Mpeg4,
    H264,
    H265,
    Vp8,
    Vp9,
    Av1,
}

/// Hardware API an encoder variant runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardwareApi {
    Software,
    Vaapi,
    Qsv,
    Nvenc,
}

impl fmt::Display for HardwareApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Software => "software",
            Self::Vaapi => "VA-API",
            Self::Qsv => "Quick Sync",
            Self::Nvenc => "NVENC",
        })
    }
}

/// Selectable video encoders, including the stream-drop and passthrough members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoCodec {
    Null,
    Copy,
    Mpeg4,

    H264Lib,
    H264Vaapi,
    H264Qsv,
    H264Nvenc,

    H265Lib,
    H265Vaapi,
    H265Qsv,
    H265Nvenc,

    Vp8Lib,
    Vp8Vaapi,
    Vp8Qsv,

    Vp9Lib,
    Vp9Vaapi,
    Vp9Qsv,

    Av1Lib,
    Av1Vaapi,
    Av1Qsv,
    Av1Nvenc,
}

impl VideoCodec {
    pub const ALL: [VideoCodec; 21] = [
        Self::Null,
        Self::Copy,
        Self::Mpeg4,
        Self::H264Lib,
        Self::H264Vaapi,
        Self::H264Qsv,
        Self::H264Nvenc,
        Self::H265Lib,
        Self::H265Vaapi,
        Self::H265Qsv,
        Self::H265Nvenc,
        Self::Vp8Lib,
        Self::Vp8Vaapi,
        Self::Vp8Qsv,
        Self::Vp9Lib,
        Self::Vp9Vaapi,
        Self::Vp9Qsv,
        Self::Av1Lib,
        Self::Av1Vaapi,
        Self::Av1Qsv,
        Self::Av1Nvenc,
    ];

    /// Get the FFmpeg encoder name
    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Copy => "copy",
            Self::Mpeg4 => "mpeg4",
            Self::H264Lib => "libx264",
            Self::H264Vaapi => "h264_vaapi",
            Self::H264Qsv => "h264_qsv",
            Self::H264Nvenc => "h264_nvenc",
            Self::H265Lib => "libx265",
            Self::H265Vaapi => "hevc_vaapi",
            Self::H265Qsv => "hevc_qsv",
            Self::H265Nvenc => "hevc_nvenc",
            Self::Vp8Lib => "libvpx",
            Self::Vp8Vaapi => "vp8_vaapi",
            Self::Vp8Qsv => "vp8_qsv",
            Self::Vp9Lib => "libvpx-vp9",
            Self::Vp9Vaapi => "vp9_vaapi",
            Self::Vp9Qsv => "vp9_qsv",
            Self::Av1Lib => "libaom-av1",
            Self::Av1Vaapi => "av1_vaapi",
            Self::Av1Qsv => "av1_qsv",
            Self::Av1Nvenc => "av1_nvenc",
        }
    }

    /// Compression standard, `None` for NULL and COPY
    pub fn standard(&self) -> Option<VideoStandard> {
        match self {
            Self::Null | Self::Copy => None,
            Self::Mpeg4 => Some(VideoStandard::Mpeg4),
            Self::H264Lib | Self::H264Vaapi | Self::H264Qsv | Self::H264Nvenc => {
                Some(VideoStandard::H264)
            }
            Self::H265Lib | Self::H265Vaapi | Self::H265Qsv | Self::H265Nvenc => {
                Some(VideoStandard::H265)
            }
            Self::Vp8Lib | Self::Vp8Vaapi | Self::Vp8Qsv => Some(VideoStandard::Vp8),
            Self::Vp9Lib | Self::Vp9Vaapi | Self::Vp9Qsv => Some(VideoStandard::Vp9),
            Self::Av1Lib | Self::Av1Vaapi | Self::Av1Qsv | Self::Av1Nvenc => {
                Some(VideoStandard::Av1)
            }
        }
    }

    pub fn api(&self) -> HardwareApi {
        match self {
            Self::H264Vaapi | Self::H265Vaapi | Self::Vp8Vaapi | Self::Vp9Vaapi | Self::Av1Vaapi => {
                HardwareApi::Vaapi
            }
            Self::H264Qsv | Self::H265Qsv | Self::Vp8Qsv | Self::Vp9Qsv | Self::Av1Qsv => {
                HardwareApi::Qsv
            }
            Self::H264Nvenc | Self::H265Nvenc | Self::Av1Nvenc => HardwareApi::Nvenc,
            _ => HardwareApi::Software,
        }
    }

    /// Check if this is a hardware encoder
    pub fn is_hardware(&self) -> bool {
        self.api() != HardwareApi::Software
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ffmpeg_name())
    }
}

impl FromStr for VideoCodec {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.ffmpeg_name() == wanted)
            .ok_or_else(|| {
                ConvertError::invalid_option(
                    "video codec",
                    format!(
                        "unknown encoder '{s}' (known: {})",
                        Self::ALL.map(|c| c.ffmpeg_name()).join(", ")
                    ),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique_and_parse_back() {
        for codec in VideoCodec::ALL {
            assert_eq!(codec.ffmpeg_name().parse::<VideoCodec>().unwrap(), codec);
        }
        let mut names: Vec<_> = VideoCodec::ALL.iter().map(|c| c.ffmpeg_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), VideoCodec::ALL.len());
    }

    #[test]
    fn test_grouping() {
        assert_eq!(VideoCodec::H265Qsv.standard(), Some(VideoStandard::H265));
        assert_eq!(VideoCodec::H265Qsv.api(), HardwareApi::Qsv);
        assert_eq!(VideoCodec::Vp9Lib.api(), HardwareApi::Software);
        assert!(!VideoCodec::Copy.is_hardware());
        assert!(VideoCodec::Av1Nvenc.is_hardware());
        assert_eq!(VideoCodec::Null.standard(), None);
    }

    #[test]
    fn test_parse_unknown_lists_known() {
        let err = "h266".parse::<VideoCodec>().unwrap_err();
        assert!(err.to_string().contains("libx264"));
    }
}
