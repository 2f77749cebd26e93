//! ffmpeg filter values, validated factories and chain serialization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{ConvertError, Result};

/// A single filter: `name=arg1:arg2:key=value`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Filter {
    name: String,
    args: Vec<String>,
    options: Vec<(String, String)>,
}

impl Filter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            options: Vec::new(),
        }
    }

    pub fn arg(mut self, value: impl ToString) -> Self {
        self.args.push(value.to_string());
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.options.push((key.into(), value.to_string()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn options(&self) -> &[(String, String)] {
        &self.options
    }

    /// Parse a user-written filter such as `crop=640:480:x=10`.
    ///
    /// Segments containing `=` become keyed options, the rest positional args.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let (name, rest) = match text.split_once('=') {
            Some((name, rest)) => (name.trim(), Some(rest)),
            None => (text, None),
        };
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ConvertError::invalid_filter(text, "expected name=arg:key=value"));
        }
        let mut filter = Filter::new(name);
        if let Some(rest) = rest {
            for part in rest.split(':') {
                match part.split_once('=') {
                    Some((key, value)) if !key.is_empty() => {
                        filter = filter.option(key.trim(), value.trim());
                    }
                    Some(_) => {
                        return Err(ConvertError::invalid_filter(text, "empty option name"));
                    }
                    None if part.trim().is_empty() => {
                        return Err(ConvertError::invalid_filter(text, "empty argument"));
                    }
                    None => filter = filter.arg(part.trim()),
                }
            }
        }
        Ok(filter)
    }

    /// Brightness, contrast, saturation and gamma; 1.0 means unchanged.
    pub fn color_eq(brightness: f64, contrast: f64, saturation: f64, gamma: f64) -> Self {
        Filter::new("eq")
            .option("brightness", fmt_num(brightness - 1.0))
            .option("contrast", fmt_num(contrast))
            .option("saturation", fmt_num(saturation))
            .option("gamma", fmt_num(gamma))
    }

    pub fn scale(width: u32, height: u32, fit: Option<AspectFit>) -> Self {
        let filter = Filter::new("scale").arg(width).arg(height);
        match fit {
            Some(fit) => filter.option("force_original_aspect_ratio", fit),
            None => filter,
        }
    }

    /// `transpose` with direction 0..=3
    pub fn transpose(direction: u8) -> Result<Self> {
        if direction > 3 {
            return Err(ConvertError::invalid_filter(
                format!("transpose={direction}"),
                "direction must be one of 0, 1, 2, 3",
            ));
        }
        Ok(Filter::new("transpose").arg(direction))
    }

    pub fn hflip() -> Self {
        Filter::new("hflip")
    }

    pub fn vflip() -> Self {
        Filter::new("vflip")
    }

    /// Motion-interpolated frame rate conversion
    pub fn minterpolate(fps: f64) -> Result<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(ConvertError::invalid_filter(
                format!("minterpolate=fps={fps}"),
                "fps must be positive",
            ));
        }
        Ok(Filter::new("minterpolate")
            .option("fps", fmt_num(fps))
            .option("mi_mode", "mci")
            .option("mc_mode", "aobmc")
            .option("me_mode", "bidir")
            .option("vsbmc", 1))
    }

    pub fn unsharp() -> Self {
        Filter::new("unsharp")
            .option("luma_msize_x", 5)
            .option("luma_msize_y", 5)
            .option("luma_amount", fmt_num(1.0))
    }

    pub fn deshake() -> Self {
        Filter::new("deshake")
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if self.args.is_empty() && self.options.is_empty() {
            return Ok(());
        }
        let parts: Vec<String> = self
            .args
            .iter()
            .cloned()
            .chain(self.options.iter().map(|(k, v)| format!("{k}={v}")))
            .collect();
        write!(f, "={}", parts.join(":"))
    }
}

impl FromStr for Filter {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        Filter::parse(s)
    }
}

/// Join filters into one comma-separated chain; empty input gives `""`
pub fn serialize_chain(filters: &[Filter]) -> String {
    filters
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Up to three decimals, no trailing zeros
fn fmt_num(value: f64) -> String {
    let s = format!("{value:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

/// `force_original_aspect_ratio` mode for `scale`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectFit {
    Increase,
    Decrease,
    Disable,
}

impl fmt::Display for AspectFit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Increase => "increase",
            Self::Decrease => "decrease",
            Self::Disable => "disable",
        })
    }
}

impl FromStr for AspectFit {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "increase" => Ok(Self::Increase),
            "decrease" => Ok(Self::Decrease),
            "disable" => Ok(Self::Disable),
            other => Err(ConvertError::invalid_option(
                "force_original_aspect_ratio",
                format!("'{other}' is not one of increase, decrease, disable"),
            )),
        }
    }
}

/// Clockwise rotation in degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise90,
    Half,
    CounterClockwise90,
}

impl Rotation {
    pub fn filters(self) -> Vec<Filter> {
        let clockwise = Filter::new("transpose").arg(1);
        match self {
            Self::Clockwise90 => vec![clockwise],
            Self::Half => vec![clockwise.clone(), clockwise],
            Self::CounterClockwise90 => vec![Filter::new("transpose").arg(2)],
        }
    }
}

impl TryFrom<i32> for Rotation {
    type Error = ConvertError;

    fn try_from(degrees: i32) -> Result<Self> {
        match degrees {
            90 => Ok(Self::Clockwise90),
            180 => Ok(Self::Half),
            -90 | 270 => Ok(Self::CounterClockwise90),
            other => Err(ConvertError::invalid_option(
                "rotation",
                format!("{other} is not one of -90, 90, 180, 270"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorAxis {
    X,
    Y,
    Both,
}

impl MirrorAxis {
    pub fn filters(self) -> Vec<Filter> {
        match self {
            Self::X => vec![Filter::hflip()],
            Self::Y => vec![Filter::vflip()],
            Self::Both => vec![Filter::hflip(), Filter::vflip()],
        }
    }
}

impl FromStr for MirrorAxis {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Self::X),
            "y" => Ok(Self::Y),
            "xy" | "yx" => Ok(Self::Both),
            other => Err(ConvertError::invalid_option(
                "mirror axis",
                format!("'{other}' is not one of x, y, xy"),
            )),
        }
    }
}

/// Video filter intent collected from the command line.
///
/// `build` emits filters in a fixed order: rotation, mirror, deshake,
/// unsharp, scale, frame interpolation, color correction, then custom filters.
#[derive(Debug, Clone)]
pub struct VideoFilterOptions {
    pub rotation: Option<Rotation>,
    pub mirror: Option<MirrorAxis>,
    pub deshake: bool,
    pub unsharp: bool,
    pub resolution: Option<(u32, u32)>,
    pub fps: Option<f64>,
    pub brightness: f64,
    pub contrast: f64,
    pub color: f64,
    pub gamma: f64,
    pub custom: Vec<Filter>,
}

impl Default for VideoFilterOptions {
    fn default() -> Self {
        Self {
            rotation: None,
            mirror: None,
            deshake: false,
            unsharp: false,
            resolution: None,
            fps: None,
            brightness: 1.0,
            contrast: 1.0,
            color: 1.0,
            gamma: 1.0,
            custom: Vec::new(),
        }
    }
}

impl VideoFilterOptions {
    pub fn build(&self) -> Result<Vec<Filter>> {
        let mut chain = Vec::new();
        if let Some(rotation) = self.rotation {
            chain.extend(rotation.filters());
        }
        if let Some(axis) = self.mirror {
            chain.extend(axis.filters());
        }
        if self.deshake {
            chain.push(Filter::deshake());
        }
        if self.unsharp {
            chain.push(Filter::unsharp());
        }
        if let Some((width, height)) = self.resolution {
            check_resolution(width, height)?;
            if width > 0 {
                chain.push(Filter::scale(width, height, None));
            }
        }
        if let Some(fps) = self.fps {
            if fps > 0.0 {
                chain.push(Filter::minterpolate(fps)?);
            }
        }
        let unchanged = |v: f64| (v - 1.0).abs() < f64::EPSILON;
        if ![self.brightness, self.contrast, self.color, self.gamma]
            .into_iter()
            .all(unchanged)
        {
            chain.push(Filter::color_eq(
                self.brightness,
                self.contrast,
                self.color,
                self.gamma,
            ));
        }
        chain.extend(self.custom.iter().cloned());
        Ok(chain)
    }
}

/// Parse a `WIDTHxHEIGHT` resolution (`1280x720`, also `1280:720`)
pub fn parse_resolution(text: &str) -> Result<(u32, u32)> {
    let invalid = || ConvertError::invalid_option("resolution", format!("'{text}' is not WIDTHxHEIGHT"));
    let (w, h) = text
        .trim()
        .split_once(['x', 'X', ':'])
        .ok_or_else(invalid)?;
    let width = w.trim().parse::<u32>().map_err(|_| invalid())?;
    let height = h.trim().parse::<u32>().map_err(|_| invalid())?;
    check_resolution(width, height)?;
    Ok((width, height))
}

/// `0x0` means no scaling; a single zero dimension is rejected
fn check_resolution(width: u32, height: u32) -> Result<()> {
    if (width == 0) != (height == 0) {
        return Err(ConvertError::invalid_option(
            "resolution",
            format!("{width}x{height} sets only one dimension"),
        ));
    }
    Ok(())
}
