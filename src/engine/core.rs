mod ffmpeg_cmd;
mod ffmpeg_info;
mod scan;
mod types;

pub use ffmpeg_cmd::{
    EncodePlan, EncodeRequest, PassOutcome, STDERR_TAIL_LINES, assemble, check_args,
    format_command, format_plan, null_target, parse_target_size, run_ffmpeg, split_extra_args,
    stderr_tail, target_bitrates, two_pass_log_prefix,
};
pub use ffmpeg_info::{
    DurationProbe, Ffprobe, FixedDuration, ffmpeg_version, ffprobe_version,
    parse_ffprobe_duration, probe_duration,
};
pub use scan::{
    MEDIA_EXTENSIONS, derive_output_path, expand_inputs, is_media_file, scan, scan_streaming,
    step_output_path,
};
pub use types::{FileJob, JobStatus, ProgressParser};
