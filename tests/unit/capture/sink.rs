use super::*;

fn cfg() -> CaptureConfig {
    CaptureConfig {
        width: 2,
        height: 1,
        fps: Fps::new(30, 1).unwrap(),
        sample_rate: 48_000,
        channels: 2,
    }
}

fn frame(px: [u8; 4]) -> FrameRGBA {
    FrameRGBA {
        width: 2,
        height: 1,
        data: [px, px].concat(),
        premultiplied: true,
    }
}

#[test]
fn config_validation_bounds() {
    assert!(cfg().validate().is_ok());
    let bad = [
        CaptureConfig { width: 0, ..cfg() },
        CaptureConfig {
            height: MAX_CAPTURE_DIM + 1,
            ..cfg()
        },
        CaptureConfig {
            fps: Fps::new(241, 1).unwrap(),
            ..cfg()
        },
        CaptureConfig {
            sample_rate: 4_000,
            ..cfg()
        },
        CaptureConfig {
            channels: 6,
            ..cfg()
        },
    ];
    for c in bad {
        let err = c.validate().unwrap_err();
        assert!(err.to_string().starts_with("capture error: "), "{err}");
    }
}

#[test]
fn suggested_bitrate_formula() {
    let c = CaptureConfig {
        width: 1920,
        height: 1080,
        fps: Fps::new(30, 1).unwrap(),
        ..cfg()
    };
    assert_eq!(c.suggested_bitrate(), 12_441_600);
}

#[test]
fn in_memory_sink_collects_stream() {
    let mut sink = InMemoryCaptureSink::new();
    sink.begin(&cfg()).unwrap();
    sink.push_frame(FrameIndex(0), &frame([1, 2, 3, 255])).unwrap();
    sink.push_audio(&[0.1, 0.2, 0.3, 0.4]).unwrap();
    let summary = sink.end().unwrap();
    assert_eq!(summary.frames, 1);
    assert_eq!(summary.audio_frames, 2);
    assert!(sink.is_ended());
    assert_eq!(sink.audio().len(), 4);
}

#[test]
fn raw_dir_sink_writes_three_files() {
    let dir = std::env::temp_dir().join(format!("vjmix-raw-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    let mut sink = RawDirSink::new(&dir);
    sink.begin(&cfg()).unwrap();
    sink.push_frame(FrameIndex(0), &frame([10, 20, 30, 128])).unwrap();
    sink.push_frame(FrameIndex(1), &frame([0, 0, 0, 255])).unwrap();
    assert!(sink.push_frame(FrameIndex(1), &frame([0, 0, 0, 255])).is_err());
    sink.push_audio(&[0.5, -0.5]).unwrap();
    let summary = sink.end().unwrap();
    assert_eq!(summary.frames, 2);

    let video = std::fs::read(dir.join("frames.rgba")).unwrap();
    assert_eq!(video.len(), 2 * 2 * 4);
    assert_eq!(&video[..4], &[10, 20, 30, 255]);
    let audio = std::fs::read(dir.join("audio.f32le")).unwrap();
    assert_eq!(&audio[..4], &0.5f32.to_le_bytes());
    let meta: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.join("meta.json")).unwrap()).unwrap();
    assert_eq!(meta["frames"], 2);
    assert_eq!(meta["audio_frames"], 1);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn raw_sink_rejects_wrong_frame_size() {
    let dir = std::env::temp_dir().join(format!("vjmix-raw-size-{}", std::process::id()));
    let mut sink = RawDirSink::new(&dir);
    sink.begin(&cfg()).unwrap();
    let wrong = FrameRGBA {
        width: 1,
        height: 1,
        data: vec![0; 4],
        premultiplied: true,
    };
    assert!(sink.push_frame(FrameIndex(0), &wrong).is_err());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn shared_sink_forwards() {
    let shared = Arc::new(Mutex::new(InMemoryCaptureSink::new()));
    let mut handle = Arc::clone(&shared);
    handle.begin(&cfg()).unwrap();
    handle.push_audio(&[0.0, 0.0]).unwrap();
    assert_eq!(shared.lock().unwrap().audio().len(), 2);
}
