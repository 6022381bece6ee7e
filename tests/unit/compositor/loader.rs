use std::time::Duration;

use super::*;
use crate::assets::clip::MIN_CLIP_BYTES;
use crate::assets::media::VideoMeta;
use crate::assets::media_type::MediaType;

fn clip(fill: u8, len: usize) -> Clip {
    Clip::from_payload(vec![fill; len], MediaType::new("video/webm"))
}

/// Solid 8x6 frames whose colour is the first payload byte; slot 1 answers slowly.
struct StubDecoder {
    hang: Option<Duration>,
}

#[async_trait::async_trait]
impl VideoDecoder for StubDecoder {
    async fn load(&self, path: &Path, req: DecodeRequest) -> LivestripResult<DecodedVideo> {
        let bytes = std::fs::read(path).map_err(|e| LivestripError::decode(e.to_string()))?;
        let shade = bytes[0];
        if shade == 2 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        if shade == 9 {
            if let Some(hang) = self.hang {
                tokio::time::sleep(hang).await;
            }
        }
        if shade == 7 {
            return Err(LivestripError::decode("corrupt stream"));
        }
        let frames = (req.fps as usize) * 2;
        Ok(DecodedVideo {
            meta: VideoMeta {
                width: 8,
                height: 6,
                duration_secs: None,
            },
            fps: req.fps,
            frames: vec![RgbaImage::from_pixel(8, 6, image::Rgba([shade, shade, shade, 255])); frames],
        })
    }
}

fn settings(dir: &Path) -> LoadSettings {
    LoadSettings {
        scratch_dir: dir.to_path_buf(),
        metadata_timeout: Duration::from_secs(1),
        request: DecodeRequest {
            fps: 10,
            max_secs: 3.0,
            fit: None,
        },
        schedule: FrameSchedule::default(),
    }
}

#[test]
fn screening_skips_missing_small_blank_and_out_of_layout_clips() {
    let mut blank = vec![0u8; MIN_CLIP_BYTES + 10];
    blank[500] = 1;
    let clips = vec![
        Some(clip(1, MIN_CLIP_BYTES + 10)),
        None,
        Some(clip(3, 100)),
        Some(Clip::from_payload(blank, MediaType::new("video/webm"))),
        Some(clip(5, MIN_CLIP_BYTES + 10)),
        Some(clip(6, MIN_CLIP_BYTES + 10)),
    ];
    let picked = screen_candidates(&clips, 5);
    let slots: Vec<usize> = picked.iter().map(|(s, _)| *s).collect();
    assert_eq!(slots, vec![0, 4]);
}

#[test]
fn region_crop_matches_requested_size() {
    let src = RgbaImage::from_pixel(40, 10, image::Rgba([9, 9, 9, 255]));
    let out = crop_to_region(&src, 20, 15);
    assert_eq!(out.dimensions(), (20, 15));
    assert_eq!(out.get_pixel(10, 7).0, [9, 9, 9, 255]);

    let same = crop_to_region(&src, 40, 10);
    assert_eq!(same, src);
}

#[tokio::test(start_paused = true)]
async fn loads_come_back_sorted_by_slot() {
    let dir = tempfile::tempdir().unwrap();
    let candidates = vec![
        (2, clip(2, MIN_CLIP_BYTES + 1)),
        (0, clip(1, MIN_CLIP_BYTES + 1)),
        (4, clip(4, MIN_CLIP_BYTES + 1)),
    ];
    let decoder: Arc<dyn VideoDecoder> = Arc::new(StubDecoder { hang: None });
    let loaded = load_all(candidates, decoder, settings(dir.path())).await;

    let slots: Vec<usize> = loaded.iter().map(LoadedVideoHandle::slot).collect();
    assert_eq!(slots, vec![0, 2, 4]);
    assert_eq!(loaded[1].video().frames[0].get_pixel(0, 0).0[0], 2);
    // No declared duration: the decoded two seconds bound playback.
    assert_eq!(loaded[0].playable_secs(), 2.0);

    for handle in loaded {
        let path = handle.resource_path().unwrap().to_path_buf();
        assert!(path.exists());
        handle.release();
        assert!(!path.exists());
    }
}

#[tokio::test(start_paused = true)]
async fn failing_and_hanging_clips_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let candidates = vec![
        (0, clip(9, MIN_CLIP_BYTES + 1)),
        (1, clip(7, MIN_CLIP_BYTES + 1)),
        (2, clip(3, MIN_CLIP_BYTES + 1)),
    ];
    let decoder: Arc<dyn VideoDecoder> = Arc::new(StubDecoder {
        hang: Some(Duration::from_secs(60)),
    });
    let loaded = load_all(candidates, decoder, settings(dir.path())).await;

    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].slot(), 2);
    drop(loaded);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn region_frames_are_cached_per_index() {
    let dir = tempfile::tempdir().unwrap();
    let decoder: Arc<dyn VideoDecoder> = Arc::new(StubDecoder { hang: None });
    let mut loaded = load_all(
        vec![(0, clip(5, MIN_CLIP_BYTES + 1))],
        decoder,
        settings(dir.path()),
    )
    .await;
    let handle = &mut loaded[0];

    let first = handle.region_frame(0.0, 4, 4).unwrap().clone();
    assert_eq!(first.dimensions(), (4, 4));
    let later = handle.region_frame(1.5, 4, 4).unwrap();
    assert_eq!(later.get_pixel(0, 0).0, [5, 5, 5, 255]);
    assert_eq!(handle.cache[0].as_ref().map(|(i, _)| *i), Some(0));
    assert_eq!(handle.cache[1].as_ref().map(|(i, _)| *i), Some(15));
}
