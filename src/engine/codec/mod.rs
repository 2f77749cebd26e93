//! Codec descriptors, the audio/video codec families and their catalogs.

mod audio;
mod descriptor;
mod registry;
mod video;

use serde::{Deserialize, Serialize};

pub use audio::AudioCodec;
pub use descriptor::{CodecDescriptor, PresetOptions, PresetTable, StreamKind};
pub use registry::{CodecFamily, audio_descriptor, video_descriptor, video_variants};
pub use video::{HardwareApi, VideoCodec, VideoStandard};

/// Output quality tier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    High,
    Medium,
    Low,
}

/// Encoder effort tier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum EncodingSpeed {
    Fast,
    Medium,
    Slow,
}

/// Bitstream profile tier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ProfileLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Quality(QualityLevel),
    Speed(EncodingSpeed),
    Profile(ProfileLevel),
}
