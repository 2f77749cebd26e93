//! Static capability catalog: base options and preset tables per encoder.
//!
//! Built once on first use. Callers always receive a clone, so per-file
//! mutation never leaks into the shared table.

use std::collections::HashMap;
use std::sync::OnceLock;

use super::descriptor::{CodecDescriptor, StreamKind};
use super::{
    AudioCodec, EncodingSpeed, HardwareApi, ProfileLevel, QualityLevel, VideoCodec, VideoStandard,
};

/// Shared surface of the audio and video codec enumerations
pub trait CodecFamily: Copy + Eq + std::hash::Hash + std::fmt::Display + 'static {
    const KIND: StreamKind;

    fn members() -> &'static [Self];

    fn ffmpeg_name(&self) -> &'static str;

    /// Fresh copy of the catalog entry for this codec
    fn descriptor(&self) -> CodecDescriptor;
}

impl CodecFamily for VideoCodec {
    const KIND: StreamKind = StreamKind::Video;

    fn members() -> &'static [Self] {
        &VideoCodec::ALL
    }

    fn ffmpeg_name(&self) -> &'static str {
        VideoCodec::ffmpeg_name(self)
    }

    fn descriptor(&self) -> CodecDescriptor {
        video_descriptor(*self)
    }
}

impl CodecFamily for AudioCodec {
    const KIND: StreamKind = StreamKind::Audio;

    fn members() -> &'static [Self] {
        &AudioCodec::ALL
    }

    fn ffmpeg_name(&self) -> &'static str {
        AudioCodec::ffmpeg_name(self)
    }

    fn descriptor(&self) -> CodecDescriptor {
        audio_descriptor(*self)
    }
}

static VIDEO_CATALOG: OnceLock<HashMap<VideoCodec, CodecDescriptor>> = OnceLock::new();
static AUDIO_CATALOG: OnceLock<HashMap<AudioCodec, CodecDescriptor>> = OnceLock::new();

pub fn video_descriptor(codec: VideoCodec) -> CodecDescriptor {
    let catalog = VIDEO_CATALOG.get_or_init(|| {
        let threads = worker_threads();
        VideoCodec::ALL
            .into_iter()
            .map(|codec| (codec, build_video_entry(codec, threads)))
            .collect()
    });
    catalog
        .get(&codec)
        .cloned()
        .unwrap_or_else(|| CodecDescriptor::new(StreamKind::Video, codec.ffmpeg_name()))
}

pub fn audio_descriptor(codec: AudioCodec) -> CodecDescriptor {
    let catalog = AUDIO_CATALOG.get_or_init(|| {
        AudioCodec::ALL
            .into_iter()
            .map(|codec| (codec, CodecDescriptor::new(StreamKind::Audio, codec.ffmpeg_name())))
            .collect()
    });
    catalog
        .get(&codec)
        .cloned()
        .unwrap_or_else(|| CodecDescriptor::new(StreamKind::Audio, codec.ffmpeg_name()))
}

/// All encoder variants of one compression standard, software first
pub fn video_variants(standard: VideoStandard) -> Vec<VideoCodec> {
    VideoCodec::ALL
        .into_iter()
        .filter(|c| c.standard() == Some(standard))
        .collect()
}

fn worker_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// libvpx/libaom tile columns: log2 of the thread count, capped at 2
fn tile_columns(threads: usize) -> u32 {
    threads.max(1).ilog2().min(2)
}

fn quality_flag(codec: VideoCodec) -> &'static [&'static str] {
    match codec.api() {
        HardwareApi::Software => &["-crf"],
        HardwareApi::Qsv => &["-global_quality"],
        HardwareApi::Vaapi => &["-rc_mode", "-qp"],
        HardwareApi::Nvenc => &["-rc", "-cq"],
    }
}

/// Quality values for (high, medium, low)
fn quality_values(codec: VideoCodec) -> Option<[u32; 3]> {
    use VideoCodec::*;
    let values = match codec {
        H264Lib | H264Qsv | H264Nvenc => [19, 23, 28],
        H265Lib | H265Qsv | H265Nvenc => [17, 21, 25],
        H264Vaapi => [20, 26, 32],
        H265Vaapi => [18, 24, 29],
        Vp8Lib => [6, 15, 28],
        Vp9Lib => [17, 30, 40],
        Av1Lib => [22, 30, 39],
        Vp8Qsv => [10, 19, 34],
        Vp9Qsv => [16, 26, 36],
        Av1Qsv | Av1Nvenc => [20, 26, 33],
        Vp8Vaapi => [12, 23, 37],
        Vp9Vaapi => [18, 28, 39],
        Av1Vaapi => [24, 32, 40],
        Null | Copy | Mpeg4 => return None,
    };
    Some(values)
}

/// Encoding speed (flag, [fast, medium, slow])
fn speed_values(codec: VideoCodec) -> Option<(&'static str, [&'static str; 3])> {
    use VideoCodec::*;
    const NAMED_PRESETS: [&str; 3] = ["faster", "medium", "slower"];
    const NVENC_PRESETS: [&str; 3] = ["p3", "p4", "p5"];
    match codec {
        H264Lib | H265Lib => Some(("-preset", NAMED_PRESETS)),
        H264Qsv | H265Qsv | Vp8Qsv | Vp9Qsv | Av1Qsv => Some(("-preset", NAMED_PRESETS)),
        H264Nvenc | H265Nvenc | Av1Nvenc => Some(("-preset", NVENC_PRESETS)),
        Vp8Lib | Vp9Lib => Some(("-cpu-used", ["6", "4", "2"])),
        Av1Lib => Some(("-cpu-used", ["7", "6", "5"])),
        _ => None,
    }
}

/// Bitstream profile for (high, medium, low)
fn profile_values(codec: VideoCodec) -> Option<[&'static str; 3]> {
    match codec.standard()? {
        VideoStandard::H264 => Some(["high", "main", "baseline"]),
        VideoStandard::H265 => Some(["main", "main", "main"]),
        _ => None,
    }
}

fn build_video_entry(codec: VideoCodec, threads: usize) -> CodecDescriptor {
    let mut entry = CodecDescriptor::new(StreamKind::Video, codec.ffmpeg_name());

    match codec {
        VideoCodec::Vp8Lib => {
            entry.set_option("-threads", Some(&threads.to_string()));
        }
        VideoCodec::Vp9Lib | VideoCodec::Av1Lib => {
            entry.set_option("-threads", Some(&threads.to_string()));
            let tiles = tile_columns(threads);
            if tiles > 0 {
                entry.set_option("-tile-columns", Some(&tiles.to_string()));
            }
            entry.set_option("-row-mt", Some("1"));
        }
        _ => {}
    }

    let levels = [QualityLevel::High, QualityLevel::Medium, QualityLevel::Low];
    if let Some(values) = quality_values(codec) {
        let flags = quality_flag(codec);
        // libvpx and libaom need -b:v 0 for constant quality
        let zero_bitrate = matches!(
            codec,
            VideoCodec::Vp8Lib | VideoCodec::Vp9Lib | VideoCodec::Av1Lib
        );
        for (level, value) in levels.into_iter().zip(values) {
            let value = value.to_string();
            let value = value.as_str();
            let mut options: Vec<(&str, &str)> = match codec.api() {
                HardwareApi::Vaapi => vec![(flags[0], "CQP"), (flags[1], value)],
                HardwareApi::Nvenc => vec![(flags[0], "vbr"), (flags[1], value)],
                _ => vec![(flags[0], value)],
            };
            if zero_bitrate {
                options.push(("-b:v", "0"));
            }
            entry = entry.with_quality(level, &options);
        }
    }

    if let Some((flag, values)) = speed_values(codec) {
        let speeds = [EncodingSpeed::Fast, EncodingSpeed::Medium, EncodingSpeed::Slow];
        for (speed, value) in speeds.into_iter().zip(values) {
            entry = entry.with_speed(speed, &[(flag, value)]);
        }
    }

    if let Some(values) = profile_values(codec) {
        let profiles = [ProfileLevel::High, ProfileLevel::Medium, ProfileLevel::Low];
        for (level, value) in profiles.into_iter().zip(values) {
            entry = entry.with_profile(level, &[("-profile:v", value)]);
        }
    }

    entry
}
