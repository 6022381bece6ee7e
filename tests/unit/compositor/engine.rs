use std::path::Path;
use std::sync::Mutex;

use super::*;
use crate::assets::clip::Clip;
use crate::assets::media::{DecodedVideo, VideoMeta};
use crate::assets::media_type::MediaType;
use crate::config::FrameSchedule;
use crate::effects::decorations::NoDecorations;
use crate::encode::sink::InMemoryEncoder;

const RED: image::Rgba<u8> = image::Rgba([255, 0, 0, 255]);

struct SolidDecoder;

#[async_trait::async_trait]
impl VideoDecoder for SolidDecoder {
    async fn load(&self, _: &Path, req: DecodeRequest) -> LivestripResult<DecodedVideo> {
        Ok(DecodedVideo {
            meta: VideoMeta {
                width: 32,
                height: 24,
                duration_secs: Some(2.0),
            },
            fps: req.fps,
            frames: vec![RgbaImage::from_pixel(32, 24, RED); 20],
        })
    }
}

fn cfg(dir: &Path) -> CompositorConfig {
    CompositorConfig {
        width: 200,
        height: 400,
        fps: 10,
        schedule: FrameSchedule {
            seconds_per_photo: 1.0,
            hold_secs: 0.5,
            loop_count: 2,
            crossfade_secs: 0.2,
        },
        scratch_dir: Some(dir.to_path_buf()),
        ..CompositorConfig::default()
    }
}

fn clip() -> Clip {
    Clip::from_payload(vec![1u8; 60_000], MediaType::new("video/webm"))
}

#[test]
fn non_encoder_errors_are_wrapped() {
    let e = as_encoder_failure(LivestripError::validation("bad"));
    assert!(matches!(e, LivestripError::EncoderFailure(ref m) if m.contains("bad")));
    let e = as_encoder_failure(LivestripError::encoder("pipe"));
    assert!(matches!(e, LivestripError::EncoderFailure(ref m) if m == "pipe"));
}

#[tokio::test(start_paused = true)]
async fn renders_loaded_slot_and_leaves_empty_slot_blank() {
    let dir = tempfile::tempdir().unwrap();
    let compositor = Compositor::new(cfg(dir.path()), Arc::new(SolidDecoder))
        .with_decorator(Arc::new(NoDecorations));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = seen.clone();
    let job = CompositionJob::new(vec![Some(clip()), None])
        .with_progress(move |p: u8| s.lock().unwrap().push(p));

    let mut enc = InMemoryEncoder::new();
    let artifact = compositor.run(job, &mut enc).await.unwrap();

    assert_eq!(artifact.media_type.as_str(), "video/mp4");
    assert_eq!(enc.frames.len(), 30);
    assert_eq!(enc.output_frames, 30);

    let layout = StripLayout::new(2, compositor.config().canvas());
    let last = enc.last_frame().unwrap();
    let (x0, y0) = PixelRect::snap(layout.slots[0], 200, 400).center();
    let (x1, y1) = PixelRect::snap(layout.slots[1], 200, 400).center();
    assert_eq!(*last.get_pixel(x0, y0), RED);
    assert_eq!(*last.get_pixel(x1, y1), WHITE);
    assert_eq!(*last.get_pixel(0, 0), BLACK);

    let seen = seen.lock().unwrap();
    assert_eq!(&seen[..3], &[10, 20, 30]);
    assert_eq!(seen.last(), Some(&100));
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test(start_paused = true)]
async fn unsupported_output_rejects_and_releases() {
    let dir = tempfile::tempdir().unwrap();
    let compositor = Compositor::new(cfg(dir.path()), Arc::new(SolidDecoder));
    let mut enc = InMemoryEncoder::new().supporting([MediaType::new("video/ogg")]);
    let err = compositor
        .run(CompositionJob::new(vec![Some(clip())]), &mut enc)
        .await
        .unwrap_err();
    assert!(matches!(err, LivestripError::UnsupportedCodec { .. }));
    assert!(!enc.began());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut bad = cfg(dir.path());
    bad.fps = 0;
    let compositor = Compositor::new(bad, Arc::new(SolidDecoder));
    let mut enc = InMemoryEncoder::new();
    let err = compositor
        .run(CompositionJob::new(vec![Some(clip())]), &mut enc)
        .await
        .unwrap_err();
    assert!(matches!(err, LivestripError::Validation(_)));
}

#[test]
fn offload_runs_inline_without_a_runtime() {
    assert_eq!(offload(|| 7), 7);
}

#[tokio::test]
async fn offload_runs_inline_on_current_thread_runtime() {
    assert_eq!(offload(|| 7), 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn renders_on_multi_thread_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let mut short = cfg(dir.path());
    short.schedule = FrameSchedule {
        seconds_per_photo: 0.3,
        hold_secs: 0.1,
        loop_count: 1,
        crossfade_secs: 0.0,
    };
    let compositor =
        Compositor::new(short, Arc::new(SolidDecoder)).with_decorator(Arc::new(NoDecorations));
    let mut enc = InMemoryEncoder::new();
    let art = compositor
        .run(CompositionJob::new(vec![Some(clip())]), &mut enc)
        .await
        .unwrap();
    assert!(!art.is_empty());
    assert!(enc.finished);
    assert!(!enc.frames.is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
