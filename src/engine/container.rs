//! Output containers: muxer names, default codecs and legal codec sets.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::codec::{
    AudioCodec, CodecDescriptor, CodecFamily, StreamKind, VideoCodec, VideoStandard,
    video_variants,
};
use super::error::{ConvertError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    Null,
    Mp4,
    Avi,
    Mkv,
    Webm,
    Mp3,
    M4a,
    Ogg,
    Opus,
    Flac,
}

impl ContainerFormat {
    pub const ALL: [ContainerFormat; 10] = [
        Self::Mp4,
        Self::Avi,
        Self::Mkv,
        Self::Webm,
        Self::Mp3,
        Self::M4a,
        Self::Ogg,
        Self::Opus,
        Self::Flac,
        Self::Null,
    ];

    /// File extension (and user-facing name)
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Mp4 => "mp4",
            Self::Avi => "avi",
            Self::Mkv => "mkv",
            Self::Webm => "webm",
            Self::Mp3 => "mp3",
            Self::M4a => "m4a",
            Self::Ogg => "ogg",
            Self::Opus => "opus",
            Self::Flac => "flac",
        }
    }

    /// Value passed to `-f`
    pub fn muxer(&self) -> &'static str {
        match self {
            Self::Mkv => "matroska",
            Self::M4a => "ipod",
            other => other.extension(),
        }
    }

    pub fn default_audio(&self) -> AudioCodec {
        match self {
            Self::Null => AudioCodec::Null,
            Self::Mp4 | Self::Mkv | Self::M4a => AudioCodec::Aac,
            Self::Avi | Self::Mp3 => AudioCodec::Mp3,
            Self::Webm | Self::Ogg => AudioCodec::Vorbis,
            Self::Opus => AudioCodec::Opus,
            Self::Flac => AudioCodec::Flac,
        }
    }

    pub fn default_video(&self) -> VideoCodec {
        match self {
            Self::Mp4 | Self::Mkv => VideoCodec::H264Lib,
            Self::Avi => VideoCodec::Mpeg4,
            Self::Webm => VideoCodec::Vp8Lib,
            _ => VideoCodec::Null,
        }
    }

    /// Containers that carry no video stream by default
    pub fn is_audio_only(&self) -> bool {
        matches!(
            self,
            Self::Mp3 | Self::M4a | Self::Ogg | Self::Opus | Self::Flac
        )
    }

    /// Audio codecs the container accepts; always includes NULL, COPY and the default
    pub fn allowed_audio_codecs(&self) -> Vec<AudioCodec> {
        let extra: &[AudioCodec] = match self {
            Self::Mp4 => &[AudioCodec::Ac3, AudioCodec::Mp3],
            Self::Avi => &[AudioCodec::PcmS16le],
            Self::Mkv => &[
                AudioCodec::Ac3,
                AudioCodec::Mp3,
                AudioCodec::Opus,
                AudioCodec::Vorbis,
                AudioCodec::Flac,
            ],
            Self::Webm => &[AudioCodec::Opus],
            _ => &[],
        };
        with_base(self.default_audio(), extra, AudioCodec::Null, AudioCodec::Copy)
    }

    /// Video codecs the container accepts; always includes NULL, COPY and the default
    pub fn allowed_video_codecs(&self) -> Vec<VideoCodec> {
        let standards: &[VideoStandard] = match self {
            Self::Mp4 => &[VideoStandard::H264, VideoStandard::H265],
            Self::Mkv => &[
                VideoStandard::H264,
                VideoStandard::H265,
                VideoStandard::Vp8,
                VideoStandard::Vp9,
                VideoStandard::Av1,
            ],
            Self::Webm => &[VideoStandard::Vp8, VideoStandard::Vp9, VideoStandard::Av1],
            _ => &[],
        };
        let extra: Vec<VideoCodec> = standards
            .iter()
            .flat_map(|s| video_variants(*s))
            .collect();
        with_base(self.default_video(), &extra, VideoCodec::Null, VideoCodec::Copy)
    }

    /// Resolve a format from an output path's extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(ext)
    }

    /// Format for a bare extension, with or without the leading dot
    pub fn from_extension(ext: &str) -> Result<Self> {
        ext.trim_start_matches('.').parse()
    }
}

fn with_base<C: Copy + PartialEq>(default: C, extra: &[C], null: C, copy: C) -> Vec<C> {
    let mut out = vec![null, copy];
    for codec in std::iter::once(default).chain(extra.iter().copied()) {
        if !out.contains(&codec) {
            out.push(codec);
        }
    }
    out
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ContainerFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().trim_start_matches('.').to_ascii_lowercase();
        let alias = match wanted.as_str() {
            "matroska" => Some(Self::Mkv),
            "oga" => Some(Self::Ogg),
            _ => None,
        };
        alias
            .or_else(|| Self::ALL.into_iter().find(|f| f.extension() == wanted))
            .ok_or_else(|| ConvertError::UnsupportedFormat {
                format: s.to_string(),
                supported: Self::ALL.iter().map(|f| f.extension().to_string()).collect(),
            })
    }
}

/// A container with its current audio and video codec choice.
#[derive(Debug, Clone)]
pub struct Container {
    format: ContainerFormat,
    audio_codec: AudioCodec,
    video_codec: VideoCodec,
    audio: CodecDescriptor,
    video: CodecDescriptor,
}

impl Container {
    /// Container with its default codecs
    pub fn new(format: ContainerFormat) -> Self {
        let audio_codec = format.default_audio();
        let video_codec = format.default_video();
        Self {
            format,
            audio_codec,
            video_codec,
            audio: audio_codec.descriptor(),
            video: video_codec.descriptor(),
        }
    }

    /// Container with optional codec overrides; `None` keeps the default.
    pub fn resolve(
        format: ContainerFormat,
        audio: Option<AudioCodec>,
        video: Option<VideoCodec>,
    ) -> Result<Self> {
        let mut container = Self::new(format);
        if let Some(codec) = audio {
            container.set_audio_codec(codec)?;
        }
        if let Some(codec) = video {
            container.set_video_codec(codec)?;
        }
        Ok(container)
    }

    pub fn set_audio_codec(&mut self, codec: AudioCodec) -> Result<()> {
        let allowed = self.format.allowed_audio_codecs();
        check_allowed(self.format, codec, &allowed)?;
        self.audio_codec = codec;
        self.audio = codec.descriptor();
        Ok(())
    }

    pub fn set_video_codec(&mut self, codec: VideoCodec) -> Result<()> {
        let allowed = self.format.allowed_video_codecs();
        check_allowed(self.format, codec, &allowed)?;
        self.video_codec = codec;
        self.video = codec.descriptor();
        Ok(())
    }

    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    pub fn audio_codec(&self) -> AudioCodec {
        self.audio_codec
    }

    pub fn video_codec(&self) -> VideoCodec {
        self.video_codec
    }

    pub fn audio(&self) -> &CodecDescriptor {
        &self.audio
    }

    pub fn video(&self) -> &CodecDescriptor {
        &self.video
    }

    pub fn audio_mut(&mut self) -> &mut CodecDescriptor {
        &mut self.audio
    }

    pub fn video_mut(&mut self) -> &mut CodecDescriptor {
        &mut self.video
    }

    /// `-f <muxer>` followed by the audio then the video tokens.
    /// The null container carries no codec tokens.
    pub fn serialize(&self) -> Vec<String> {
        let mut args = vec!["-f".to_string(), self.format.muxer().to_string()];
        if self.format == ContainerFormat::Null {
            return args;
        }
        args.extend(self.audio.serialize());
        args.extend(self.video.serialize());
        args
    }
}

fn check_allowed<C: CodecFamily>(format: ContainerFormat, codec: C, allowed: &[C]) -> Result<()> {
    if allowed.contains(&codec) {
        return Ok(());
    }
    let mut names: Vec<String> = allowed.iter().map(|c| c.ffmpeg_name().to_string()).collect();
    names.sort();
    Err(ConvertError::UnsupportedCodec {
        container: format.extension().to_string(),
        stream: C::KIND,
        codec: codec.ffmpeg_name().to_string(),
        allowed: names,
    })
}

/// Whether `kind` of `codec` may be muxed into `format`
pub fn is_allowed(format: ContainerFormat, kind: StreamKind, codec: &str) -> bool {
    match kind {
        StreamKind::Audio => format
            .allowed_audio_codecs()
            .iter()
            .any(|c| c.ffmpeg_name() == codec),
        StreamKind::Video => format
            .allowed_video_codecs()
            .iter()
            .any(|c| c.ffmpeg_name() == codec),
    }
}
