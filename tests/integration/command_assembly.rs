use std::path::Path;

use ffbatch::engine::codec::{AudioCodec, ProfileLevel, QualityLevel, VideoCodec};
use ffbatch::engine::filter::Filter;
use ffbatch::engine::{
    ContainerFormat, ConvertError, DurationProbe, EncodeRequest, FixedDuration, Settings,
};

use crate::common::{assert_cmd_contains, assert_cmd_not_contains, joined, plan, plan_with};

struct FailingProbe;

impl DurationProbe for FailingProbe {
    fn duration(&self, _path: &Path) -> anyhow::Result<f64> {
        anyhow::bail!("ffprobe exited with status 1")
    }
}

#[test]
fn test_copy_stream_carries_no_encoder_options() {
    let request = EncodeRequest {
        audio_codec: Some(AudioCodec::Copy),
        video_codec: Some(VideoCodec::Copy),
        quality: Some(QualityLevel::High),
        video_filters: vec![Filter::hflip()],
        audio_filters: vec![Filter::parse("volume=2").unwrap()],
        ..EncodeRequest::new(ContainerFormat::Mkv)
    };
    let cmd = joined(&plan(&request).unwrap()).remove(0);
    assert_cmd_contains(&cmd, "-c:a copy -c:v copy /tmp/output.out");
    assert_cmd_not_contains(&cmd, "-vf");
    assert_cmd_not_contains(&cmd, "-af");
    assert_cmd_not_contains(&cmd, "-crf");
}

#[test]
fn test_unsupported_preset_is_a_no_op() {
    let base = EncodeRequest {
        video_codec: Some(VideoCodec::Vp9Vaapi),
        ..EncodeRequest::new(ContainerFormat::Mkv)
    };
    let with_profile = EncodeRequest {
        profile: Some(ProfileLevel::High),
        ..base.clone()
    };
    assert_eq!(plan(&base).unwrap(), plan(&with_profile).unwrap());
    let cmd = joined(&plan(&with_profile).unwrap()).remove(0);
    assert_cmd_not_contains(&cmd, "-profile:v");
}

#[test]
fn test_quality_preset_per_api() {
    let request = EncodeRequest {
        video_codec: Some(VideoCodec::H264Vaapi),
        quality: Some(QualityLevel::Medium),
        ..EncodeRequest::new(ContainerFormat::Mp4)
    };
    let cmd = joined(&plan(&request).unwrap()).remove(0);
    assert_cmd_contains(&cmd, "-c:v h264_vaapi -rc_mode CQP -qp 26");
}

#[test]
fn test_bitrate_values_reach_the_command() {
    for kbps in [1000, 2000] {
        let request = EncodeRequest {
            video_bitrate: Some(kbps),
            ..EncodeRequest::new(ContainerFormat::Mp4)
        };
        let plan = plan(&request).unwrap();
        assert_eq!(plan.video_kbps, kbps as u32);
        assert_cmd_contains(&joined(&plan)[1], &format!("-b:v {kbps}k"));
    }
}

#[test]
fn test_zero_bitrate_means_single_pass() {
    let request = EncodeRequest {
        video_bitrate: Some(0),
        audio_bitrate: Some(0),
        ..EncodeRequest::new(ContainerFormat::Mp4)
    };
    assert_eq!(request.passes(), 1);
    let plan = plan(&request).unwrap();
    assert!(!plan.is_two_pass());
    assert!(plan.passlog_prefix.is_none());
    let cmd = &joined(&plan)[0];
    assert_cmd_not_contains(cmd, "-b:v");
    assert_cmd_not_contains(cmd, "-pass");
}

#[test]
fn test_negative_bitrate_is_ignored() {
    let request = EncodeRequest {
        video_bitrate: Some(-500),
        ..EncodeRequest::new(ContainerFormat::Mp4)
    };
    let plan = plan(&request).unwrap();
    assert_eq!(plan.passes.len(), 1);
    assert_cmd_not_contains(&joined(&plan)[0], "-b:v");
}

#[test]
fn test_audio_bitrate_triggers_two_passes() {
    let request = EncodeRequest {
        audio_bitrate: Some(192),
        ..EncodeRequest::new(ContainerFormat::Mp4)
    };
    assert!(request.expects_two_pass());
    let plan = plan(&request).unwrap();
    assert!(plan.is_two_pass());

    let passes = joined(&plan);
    // Pass 1 skips audio and always overwrites the discarded output
    assert!(passes[0].starts_with("-y -progress - -nostats -i /tmp/input.mov -f null -an -c:v libx264"));
    assert_cmd_contains(&passes[0], "-pass 1 -passlogfile");
    assert!(!passes[0].ends_with("/tmp/output.out"));

    // Pass 2 keeps the caller's overwrite choice and writes the real output
    assert!(passes[1].starts_with("-n -progress - -nostats -i /tmp/input.mov -f mp4"));
    assert_cmd_contains(&passes[1], "-c:a aac -b:a 192k -c:v libx264");
    assert_cmd_contains(&passes[1], "-pass 2 -passlogfile");
    assert!(passes[1].ends_with("/tmp/output.out"));

    let prefix = plan.passlog_prefix.unwrap();
    assert!(prefix.ends_with("ffmpeg2pass"));
    assert_cmd_contains(&passes[0], &prefix.to_string_lossy());
}

#[test]
fn test_overwrite_setting() {
    let settings = Settings {
        overwrite: true,
        ..Settings::default()
    };
    let plan = plan_with(
        &EncodeRequest::new(ContainerFormat::Webm),
        &FixedDuration(1.0),
        &settings,
    )
    .unwrap();
    assert_eq!(plan.passes[0][0], "-y");
}

#[test]
fn test_target_size_derives_bitrates() {
    let request = EncodeRequest {
        target_size: 10 * 1024 * 1024,
        ..EncodeRequest::new(ContainerFormat::Mp4)
    };
    let plan = plan(&request).unwrap();
    // 10 MiB over 60s is 1365 kbps; audio keeps 128 of it
    assert_eq!(plan.audio_kbps, 128);
    assert_eq!(plan.video_kbps, 1237);
    let pass2 = &joined(&plan)[1];
    assert_cmd_contains(pass2, "-b:a 128k");
    assert_cmd_contains(pass2, "-b:v 1237k");
}

#[test]
fn test_target_size_probe_failure() {
    let request = EncodeRequest {
        target_size: 10 * 1024 * 1024,
        ..EncodeRequest::new(ContainerFormat::Mp4)
    };
    let err = plan_with(&request, &FailingProbe, &Settings::default()).unwrap_err();
    match err {
        ConvertError::TargetSizeUnresolvable { path, reason } => {
            assert_eq!(path, Path::new("/tmp/input.mov"));
            assert!(reason.contains("ffprobe exited"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_target_size_too_small() {
    let request = EncodeRequest {
        target_size: 100 * 1024,
        ..EncodeRequest::new(ContainerFormat::Mp4)
    };
    let err = plan(&request).unwrap_err();
    assert!(matches!(err, ConvertError::TargetSizeTooSmall { .. }));
    assert!(err.to_string().contains("at least"));
}

#[test]
fn test_filters_and_extra_args_placement() {
    let request = EncodeRequest {
        video_filters: vec![Filter::scale(1280, 720, None), Filter::hflip()],
        extra_args: "-metadata title=\"My Clip\"".to_string(),
        ..EncodeRequest::new(ContainerFormat::Mkv)
    };
    let args = plan(&request).unwrap().passes.remove(0);
    let vf = args.iter().position(|a| a == "-vf").unwrap();
    assert_eq!(args[vf + 1], "scale=1280:720,hflip");
    let n = args.len();
    assert_eq!(args[n - 3..], ["-metadata", "title=My Clip", "/tmp/output.out"]);
}

#[test]
fn test_requests_do_not_share_state() {
    let tuned = EncodeRequest {
        quality: Some(QualityLevel::Low),
        ..EncodeRequest::new(ContainerFormat::Mp4)
    };
    assert_cmd_contains(&joined(&plan(&tuned).unwrap())[0], "-crf 28");
    let plain = joined(&plan(&EncodeRequest::new(ContainerFormat::Mp4)).unwrap()).remove(0);
    assert_cmd_not_contains(&plain, "-crf");
}
