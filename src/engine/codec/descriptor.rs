use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use tracing::warn;

use super::{EncodingSpeed, Preset, ProfileLevel, QualityLevel};
use crate::engine::filter::{Filter, serialize_chain};

/// Which stream of a container a codec belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Audio,
    Video,
}

impl StreamKind {
    /// Token that selects the encoder (`-c:a` / `-c:v`)
    pub fn codec_flag(self) -> &'static str {
        match self {
            Self::Audio => "-c:a",
            Self::Video => "-c:v",
        }
    }

    /// Token that drops the stream entirely (`-an` / `-vn`)
    pub fn disabled_flag(self) -> &'static str {
        match self {
            Self::Audio => "-an",
            Self::Video => "-vn",
        }
    }

    pub fn bitrate_flag(self) -> &'static str {
        match self {
            Self::Audio => "-b:a",
            Self::Video => "-b:v",
        }
    }

    pub fn filter_flag(self) -> &'static str {
        match self {
            Self::Audio => "-af",
            Self::Video => "-vf",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => f.write_str("audio"),
            Self::Video => f.write_str("video"),
        }
    }
}

/// Flag/value pairs a preset writes into the option map
pub type PresetOptions = Vec<(String, String)>;

pub type PresetTable<K> = HashMap<K, PresetOptions>;

/// One selectable encoder with its current option set.
///
/// Options keep insertion order so serialized arguments are deterministic.
/// Two descriptors are equal when they name the same encoder, regardless of
/// the options applied to them.
#[derive(Debug, Clone)]
pub struct CodecDescriptor {
    kind: StreamKind,
    name: String,
    options: Vec<(String, Option<String>)>,
    bitrate: u32,
    quality: PresetTable<QualityLevel>,
    speed: PresetTable<EncodingSpeed>,
    profile: PresetTable<ProfileLevel>,
}

impl CodecDescriptor {
    pub fn new(kind: StreamKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            options: Vec::new(),
            bitrate: 0,
            quality: HashMap::new(),
            speed: HashMap::new(),
            profile: HashMap::new(),
        }
    }

    pub fn with_option(mut self, flag: &str, value: Option<&str>) -> Self {
        self.set_option(flag, value);
        self
    }

    pub fn with_quality(mut self, level: QualityLevel, options: &[(&str, &str)]) -> Self {
        self.quality.insert(level, to_owned_pairs(options));
        self
    }

    pub fn with_speed(mut self, speed: EncodingSpeed, options: &[(&str, &str)]) -> Self {
        self.speed.insert(speed, to_owned_pairs(options));
        self
    }

    pub fn with_profile(mut self, level: ProfileLevel, options: &[(&str, &str)]) -> Self {
        self.profile.insert(level, to_owned_pairs(options));
        self
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current bitrate in kbit/s, 0 when unset
    pub fn bitrate(&self) -> u32 {
        self.bitrate
    }

    pub fn options(&self) -> &[(String, Option<String>)] {
        &self.options
    }

    pub fn option(&self, flag: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(f, _)| f == flag)
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn has_option(&self, flag: &str) -> bool {
        self.options.iter().any(|(f, _)| f == flag)
    }

    /// `null` or an unnamed codec: the stream is dropped
    pub fn is_disabled(&self) -> bool {
        self.name.is_empty() || self.name == "null"
    }

    pub fn is_copy(&self) -> bool {
        self.name == "copy"
    }

    /// Merge an option into the map.
    ///
    /// A new flag is appended. For an existing flag a non-empty value is
    /// joined to the old one with a comma; an empty value leaves it untouched.
    pub fn set_option(&mut self, flag: &str, value: Option<&str>) {
        let value = value.filter(|v| !v.is_empty());
        match self.options.iter_mut().find(|(f, _)| f == flag) {
            Some((_, current)) => {
                if let Some(new) = value {
                    *current = match current.take() {
                        Some(old) if !old.is_empty() => Some(format!("{old},{new}")),
                        _ => Some(new.to_string()),
                    };
                }
            }
            None => self
                .options
                .push((flag.to_string(), value.map(str::to_string))),
        }
    }

    /// Replace an option's value in place, or append it when absent.
    pub fn override_option(&mut self, flag: &str, value: Option<&str>) {
        let value = value.map(str::to_string);
        match self.options.iter_mut().find(|(f, _)| f == flag) {
            Some((_, current)) => *current = value,
            None => self.options.push((flag.to_string(), value)),
        }
    }

    pub fn unset_option(&mut self, flag: &str) {
        self.options.retain(|(f, _)| f != flag);
    }

    /// Apply a named preset. Returns `false` (and leaves the options alone)
    /// when this codec has no entry for it.
    pub fn apply_preset(&mut self, preset: Preset) -> bool {
        let options = match preset {
            Preset::Quality(level) => self.quality.get(&level),
            Preset::Speed(speed) => self.speed.get(&speed),
            Preset::Profile(level) => self.profile.get(&level),
        };
        let Some(options) = options.cloned() else {
            warn!(codec = %self.name, ?preset, "preset not available for codec, ignoring");
            return false;
        };
        for (flag, value) in &options {
            self.override_option(flag, Some(value));
        }
        true
    }

    pub fn set_quality(&mut self, level: QualityLevel) -> bool {
        self.apply_preset(Preset::Quality(level))
    }

    pub fn set_encoding_speed(&mut self, speed: EncodingSpeed) -> bool {
        self.apply_preset(Preset::Speed(speed))
    }

    pub fn set_profile(&mut self, level: ProfileLevel) -> bool {
        self.apply_preset(Preset::Profile(level))
    }

    pub fn supports(&self, preset: Preset) -> bool {
        match preset {
            Preset::Quality(level) => self.quality.contains_key(&level),
            Preset::Speed(speed) => self.speed.contains_key(&speed),
            Preset::Profile(level) => self.profile.contains_key(&level),
        }
    }

    /// Set the stream bitrate in kbit/s. Zero clears it; negative values are
    /// rejected with a warning and also clear it.
    pub fn set_bitrate(&mut self, kbps: i64) {
        let flag = self.kind.bitrate_flag();
        if kbps <= 0 {
            if kbps < 0 {
                warn!(codec = %self.name, kbps, "negative bitrate, leaving bitrate unset");
            }
            self.unset_option(flag);
            self.bitrate = 0;
            return;
        }
        let kbps = u32::try_from(kbps).unwrap_or(u32::MAX);
        self.override_option(flag, Some(&format!("{kbps}k")));
        self.bitrate = kbps;
    }

    /// Attach a filter chain under `-af`/`-vf`. Repeated calls extend the
    /// chain; an empty slice emits nothing.
    pub fn set_filters(&mut self, filters: &[Filter]) {
        if filters.is_empty() {
            return;
        }
        let chain = serialize_chain(filters);
        self.set_option(self.kind.filter_flag(), Some(&chain));
    }

    /// Argument tokens for this stream
    pub fn serialize(&self) -> Vec<String> {
        if self.is_disabled() {
            return vec![self.kind.disabled_flag().to_string()];
        }
        let mut args = vec![self.kind.codec_flag().to_string(), self.name.clone()];
        if self.is_copy() {
            return args;
        }
        for (flag, value) in &self.options {
            args.push(flag.clone());
            if let Some(value) = value {
                args.push(value.clone());
            }
        }
        args
    }
}

fn to_owned_pairs(options: &[(&str, &str)]) -> PresetOptions {
    options
        .iter()
        .map(|(f, v)| (f.to_string(), v.to_string()))
        .collect()
}

impl PartialEq for CodecDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for CodecDescriptor {}

impl Hash for CodecDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for CodecDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
