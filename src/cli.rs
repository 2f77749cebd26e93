use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use ffbatch::engine::codec::{AudioCodec, EncodingSpeed, ProfileLevel, QualityLevel, VideoCodec};

#[derive(Parser)]
#[command(name = "ffbatch", version)]
#[command(about = "Batch media converter driving ffmpeg", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose logging (debug level)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert files (or every media file under a directory) to another format
    Convert(ConvertArgs),

    /// Decode files fully and report the damaged ones
    Check {
        /// Files or directories to check
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Show duration and streams of a media file
    Probe {
        /// Path to the media file
        file: PathBuf,
    },

    /// List output formats and the codecs each accepts
    Codecs {
        /// Only show this format
        #[arg(long)]
        format: Option<String>,
    },

    /// Check if ffmpeg and ffprobe are installed
    CheckFfmpeg,

    /// Show config status and location, or create default config if missing
    InitConfig,
}

#[derive(Args)]
pub struct ConvertArgs {
    /// Files or directories to convert
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output format (mp4, mkv, webm, mp3, ...)
    #[arg(short, long)]
    pub format: String,

    /// Output directory (defaults to each input's directory)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Text appended to output file names
    #[arg(long, default_value = "")]
    pub stem: String,

    #[arg(long, value_name = "CODEC")]
    pub audio_codec: Option<AudioCodec>,

    #[arg(long, value_name = "CODEC")]
    pub video_codec: Option<VideoCodec>,

    /// Audio bitrate in kbit/s (0 leaves it to the encoder)
    #[arg(long, value_name = "KBPS", allow_negative_numbers = true)]
    pub audio_bitrate: Option<i64>,

    /// Video bitrate in kbit/s; any positive bitrate enables two-pass encoding
    #[arg(long, value_name = "KBPS", allow_negative_numbers = true)]
    pub video_bitrate: Option<i64>,

    #[arg(long, value_enum)]
    pub quality: Option<QualityLevel>,

    #[arg(long, value_enum)]
    pub speed: Option<EncodingSpeed>,

    #[arg(long, value_enum)]
    pub profile: Option<ProfileLevel>,

    /// Scale to WIDTHxHEIGHT
    #[arg(long, value_name = "WxH")]
    pub resolution: Option<String>,

    /// Interpolate to this frame rate
    #[arg(long)]
    pub fps: Option<f64>,

    /// Rotate clockwise by degrees (-90, 90, 180, 270)
    #[arg(long, allow_negative_numbers = true)]
    pub rotate: Option<i32>,

    /// Mirror along x, y or xy
    #[arg(long, value_name = "AXIS")]
    pub mirror: Option<String>,

    #[arg(long)]
    pub deshake: bool,

    #[arg(long)]
    pub unsharp: bool,

    /// Brightness factor (1.0 = unchanged)
    #[arg(long, default_value_t = 1.0)]
    pub brightness: f64,

    /// Contrast factor (1.0 = unchanged)
    #[arg(long, default_value_t = 1.0)]
    pub contrast: f64,

    /// Saturation factor (1.0 = unchanged)
    #[arg(long, default_value_t = 1.0)]
    pub color: f64,

    /// Gamma factor (1.0 = unchanged)
    #[arg(long, default_value_t = 1.0)]
    pub gamma: f64,

    /// Extra video filter, e.g. "scale=640:-1" (repeatable)
    #[arg(long = "video-filter", value_name = "FILTER")]
    pub video_filters: Vec<String>,

    /// Extra audio filter, e.g. "volume=2" (repeatable)
    #[arg(long = "audio-filter", value_name = "FILTER")]
    pub audio_filters: Vec<String>,

    /// Target output size (e.g. 700K, 100M, 1.5G); enables two-pass encoding
    #[arg(long, value_name = "SIZE")]
    pub target_size: Option<String>,

    /// Extra ffmpeg output options, quoted as one argument
    #[arg(long, value_name = "ARGS", allow_hyphen_values = true)]
    pub ffmpeg_args: Option<String>,

    /// Replace existing output files
    #[arg(long)]
    pub overwrite: bool,

    /// Keep going when a file fails
    #[arg(long)]
    pub keep_going: bool,

    /// Print the ffmpeg commands without running them
    #[arg(long)]
    pub dry_run: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}
