use ffbatch::engine::codec::{AudioCodec, StreamKind, VideoCodec};
use ffbatch::engine::container::is_allowed;
use ffbatch::engine::{Container, ContainerFormat, ConvertError};

#[test]
fn test_every_pair_matches_allowed_sets() {
    for format in ContainerFormat::ALL {
        let audio_allowed = format.allowed_audio_codecs();
        for codec in AudioCodec::ALL {
            let result = Container::resolve(format, Some(codec), None);
            assert_eq!(
                result.is_ok(),
                audio_allowed.contains(&codec),
                "{format} with audio {codec}"
            );
            assert_eq!(
                is_allowed(format, StreamKind::Audio, codec.ffmpeg_name()),
                audio_allowed.contains(&codec)
            );
        }

        let video_allowed = format.allowed_video_codecs();
        for codec in VideoCodec::ALL {
            let result = Container::resolve(format, None, Some(codec));
            assert_eq!(
                result.is_ok(),
                video_allowed.contains(&codec),
                "{format} with video {codec}"
            );
        }
    }
}

#[test]
fn test_null_copy_and_defaults_always_allowed() {
    for format in ContainerFormat::ALL {
        let audio = format.allowed_audio_codecs();
        let video = format.allowed_video_codecs();
        assert!(audio.contains(&AudioCodec::Null) && audio.contains(&AudioCodec::Copy));
        assert!(video.contains(&VideoCodec::Null) && video.contains(&VideoCodec::Copy));
        assert!(audio.contains(&format.default_audio()), "{format}");
        assert!(video.contains(&format.default_video()), "{format}");
    }
}

#[test]
fn test_mp4_rejects_vp9_naming_allowed_set() {
    let err = Container::resolve(ContainerFormat::Mp4, None, Some(VideoCodec::Vp9Lib)).unwrap_err();
    match &err {
        ConvertError::UnsupportedCodec {
            container,
            stream,
            codec,
            allowed,
        } => {
            assert_eq!(container, "mp4");
            assert_eq!(*stream, StreamKind::Video);
            assert_eq!(codec, "libvpx-vp9");
            let mut sorted = allowed.clone();
            sorted.sort();
            assert_eq!(allowed, &sorted);
            for name in ["copy", "null", "libx264", "hevc_nvenc", "h264_vaapi"] {
                assert!(allowed.iter().any(|a| a == name), "missing {name}");
            }
            assert!(!allowed.iter().any(|a| a.contains("vp9")));
        }
        other => panic!("unexpected error: {other}"),
    }
    let message = err.to_string();
    assert!(message.contains("libvpx-vp9"));
    assert!(message.contains("libx264"));
}

#[test]
fn test_mkv_accepts_vp9() {
    let container = Container::resolve(ContainerFormat::Mkv, None, Some(VideoCodec::Vp9Lib)).unwrap();
    let args = container.serialize();
    assert_eq!(
        &args[..6],
        ["-f", "matroska", "-c:a", "aac", "-c:v", "libvpx-vp9"]
    );
}

#[test]
fn test_audio_only_containers_drop_video() {
    for format in [
        ContainerFormat::Mp3,
        ContainerFormat::M4a,
        ContainerFormat::Ogg,
        ContainerFormat::Opus,
        ContainerFormat::Flac,
    ] {
        assert!(format.is_audio_only());
        let args = Container::new(format).serialize();
        assert_eq!(args.last().map(String::as_str), Some("-vn"), "{format}");
    }
}

#[test]
fn test_null_container_emits_only_muxer() {
    let container = Container::resolve(ContainerFormat::Null, Some(AudioCodec::Copy), None).unwrap();
    assert_eq!(container.serialize(), ["-f", "null"]);
}

#[test]
fn test_format_lookup() {
    assert_eq!(
        ContainerFormat::from_extension(".WEBM").unwrap(),
        ContainerFormat::Webm
    );
    assert_eq!(
        ContainerFormat::from_path(std::path::Path::new("song.m4a")).unwrap(),
        ContainerFormat::M4a
    );
    assert_eq!(ContainerFormat::M4a.muxer(), "ipod");
    assert!(matches!(
        ContainerFormat::from_extension("txt"),
        Err(ConvertError::UnsupportedFormat { .. })
    ));
}

#[test]
fn test_switching_codec_resets_options() {
    let mut container = Container::new(ContainerFormat::Mkv);
    container.video_mut().set_option("-tune", Some("film"));
    container.set_video_codec(VideoCodec::H265Lib).unwrap();
    assert!(!container.video().has_option("-tune"));
    assert_eq!(container.video_codec(), VideoCodec::H265Lib);

    // A rejected codec leaves the current one in place
    assert!(container.set_audio_codec(AudioCodec::PcmS16le).is_err());
    assert_eq!(container.audio_codec(), AudioCodec::Aac);
}
