use std::fs;

use ffbatch::config::Config;
use ffbatch::engine::codec::QualityLevel;
use ffbatch::engine::{BitrateSplit, ContainerFormat, EncodeRequest, FixedDuration};
use tempfile::TempDir;

use crate::common::plan_with;

#[test]
fn test_ratio_split_from_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[defaults]
overwrite = true
video_quality = "low"

[engine]
ffmpeg_bin = "/opt/ffmpeg/bin/ffmpeg"

[engine.bitrate_split]
mode = "ratio"
audio = 0.25
"#,
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.defaults.video_quality, Some(QualityLevel::Low));
    assert_eq!(config.engine.bitrate_split, BitrateSplit::Ratio { audio: 0.25 });
    assert_eq!(config.engine.ffprobe_bin, "ffprobe");

    let settings = config.settings(false);
    assert!(settings.overwrite);
    assert_eq!(settings.ffmpeg_bin, "/opt/ffmpeg/bin/ffmpeg");

    // 10 MiB over 60s is 1365 kbps; a quarter goes to audio
    let request = EncodeRequest {
        target_size: 10 * 1024 * 1024,
        ..EncodeRequest::new(ContainerFormat::Mkv)
    };
    let plan = plan_with(&request, &FixedDuration(60.0), &settings).unwrap();
    assert_eq!(plan.audio_kbps, 341);
    assert_eq!(plan.video_kbps, 1024);
    assert_eq!(plan.passes[1][0], "-y");
}

#[test]
fn test_saved_config_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.defaults.output_dir = Some(dir.path().join("exports"));
    config.engine.bitrate_split = BitrateSplit::FixedAudio { kbps: 96 };
    config.save_to(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("mode = \"fixed_audio\""));
    assert!(!text.contains("video_quality"));
    assert_eq!(Config::load_from(&path).unwrap(), config);
}
