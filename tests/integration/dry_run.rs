use std::path::PathBuf;

use ffbatch::engine::codec::AudioCodec;
use ffbatch::engine::{
    ConvertError, ConvertOptions, EncodeRequest, FixedDuration, JobStatus, Settings, check_batch,
    convert_batch, format_plan, plan_batch,
};
use tempfile::TempDir;

use crate::common::{assert_cmd_contains, make_inputs};

#[test]
fn test_plan_batch_names_outputs() {
    let options = ConvertOptions {
        output_dir: Some(PathBuf::from("/exports")),
        out_stem: "_web".to_string(),
        ..ConvertOptions::default()
    };
    let plans = plan_batch(
        vec![PathBuf::from("/src/one.mov"), PathBuf::from("/src/two.avi")],
        "webm",
        &EncodeRequest::default(),
        &options,
        &Settings::default(),
        &FixedDuration(30.0),
    )
    .unwrap();

    let outputs: Vec<_> = plans.iter().map(|(job, _)| job.output_path.clone()).collect();
    assert_eq!(
        outputs,
        [
            PathBuf::from("/exports/one_web.webm"),
            PathBuf::from("/exports/two_web.webm")
        ]
    );
    for (job, plan) in &plans {
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(plan.passes.len(), 1);
        assert_eq!(plan.passes[0][3..6], ["-nostats", "-i", &*job.input_path.to_string_lossy()]);
    }
}

#[test]
fn test_plan_batch_rejects_bad_request_up_front() {
    let request = EncodeRequest {
        audio_codec: Some(AudioCodec::Aac),
        ..EncodeRequest::default()
    };
    let err = plan_batch(
        vec![PathBuf::from("/src/one.mov")],
        "ogg",
        &request,
        &ConvertOptions::default(),
        &Settings::default(),
        &FixedDuration(30.0),
    )
    .unwrap_err();
    assert!(matches!(err, ConvertError::UnsupportedCodec { .. }));

    let err = plan_batch(
        vec![PathBuf::from("/src/one.mov")],
        "docx",
        &EncodeRequest::default(),
        &ConvertOptions::default(),
        &Settings::default(),
        &FixedDuration(30.0),
    )
    .unwrap_err();
    assert!(matches!(err, ConvertError::UnsupportedFormat { .. }));
}

#[test]
fn test_format_plan_chains_passes() {
    let request = EncodeRequest {
        video_bitrate: Some(800),
        ..EncodeRequest::default()
    };
    let plans = plan_batch(
        vec![PathBuf::from("/src/clip.mov")],
        "mp4",
        &request,
        &ConvertOptions::default(),
        &Settings::default(),
        &FixedDuration(30.0),
    )
    .unwrap();
    let text = format_plan("ffmpeg", &plans[0].1);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("ffmpeg -y"));
    assert_eq!(lines[1], "&& \\");
    assert!(lines[2].starts_with("ffmpeg -n"));
    assert_cmd_contains(lines[2], "/src/clip.mp4");
}

#[cfg(unix)]
#[test]
fn test_convert_batch_with_succeeding_engine() {
    let dir = TempDir::new().unwrap();
    let inputs = make_inputs(dir.path(), &["a.wav", "b.wav"]);
    let settings = Settings {
        ffmpeg_bin: "true".to_string(),
        ..Settings::default()
    };
    let request = EncodeRequest {
        audio_bitrate: Some(128),
        ..EncodeRequest::default()
    };

    let mut values = Vec::new();
    let report = convert_batch(
        inputs,
        "mp3",
        &request,
        &ConvertOptions::default(),
        &settings,
        &FixedDuration(10.0),
        |v| values.push(v),
    )
    .unwrap();

    assert_eq!(report.succeeded(), 2);
    assert!(report.jobs.iter().all(|j| j.steps == 2));
    assert_eq!(values.last().copied(), Some(100.0));
    assert!(values.windows(2).all(|w| w[0] < w[1]));
}

#[cfg(unix)]
#[test]
fn test_convert_batch_reports_engine_failure() {
    let dir = TempDir::new().unwrap();
    let inputs = make_inputs(dir.path(), &["a.wav"]);
    let settings = Settings {
        ffmpeg_bin: "false".to_string(),
        ..Settings::default()
    };

    let mut values = Vec::new();
    let err = convert_batch(
        inputs,
        "flac",
        &EncodeRequest::default(),
        &ConvertOptions::default(),
        &settings,
        &FixedDuration(10.0),
        |v| values.push(v),
    )
    .unwrap_err();

    match err {
        ConvertError::EngineFailed { pass, path, .. } => {
            assert_eq!(pass, 1);
            assert!(path.ends_with("a.wav"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(values.is_empty());
}

#[test]
fn test_missing_engine_binary() {
    let dir = TempDir::new().unwrap();
    let inputs = make_inputs(dir.path(), &["a.wav"]);
    let settings = Settings {
        ffmpeg_bin: "ffbatch-no-such-binary".to_string(),
        ..Settings::default()
    };
    let err = convert_batch(
        inputs,
        "ogg",
        &EncodeRequest::default(),
        &ConvertOptions::default(),
        &settings,
        &FixedDuration(10.0),
        |_| {},
    )
    .unwrap_err();
    assert!(matches!(err, ConvertError::EngineSpawn { .. }));
    assert!(err.to_string().contains("ffbatch-no-such-binary"));
}

#[cfg(unix)]
#[test]
fn test_check_batch_continues_past_damaged_files() {
    let dir = TempDir::new().unwrap();
    let mut inputs = make_inputs(dir.path(), &["good.mp4"]);
    inputs.push(dir.path().join("missing.mp4"));

    let settings = Settings {
        ffmpeg_bin: "true".to_string(),
        ..Settings::default()
    };
    let err = check_batch(inputs, &settings, &FixedDuration(5.0), None, |_| {}).unwrap_err();
    assert!(matches!(
        err,
        ConvertError::BatchFailed {
            failed: 1,
            total: 2
        }
    ));
}
