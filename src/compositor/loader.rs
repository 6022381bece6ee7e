use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use image::imageops::{self, FilterType};
use tokio::task::JoinSet;

use crate::assets::clip::{Clip, check_container_plausibility};
use crate::assets::media::{DecodeRequest, DecodedVideo, VideoDecoder};
use crate::assets::resource::PlaybackResource;
use crate::compositor::layout::cover_crop;
use crate::compositor::timeline::SlotPlayback;
use crate::config::FrameSchedule;
use crate::foundation::core::WHITE;
use crate::foundation::error::{LivestripError, LivestripResult};

/// A decoded clip bound to its slot and its playback resource.
///
/// The slot index comes from the job, not from load order.
#[derive(Debug)]
pub struct LoadedVideoHandle {
    slot: usize,
    video: DecodedVideo,
    resource: PlaybackResource,
    playable_secs: f64,
    pub(crate) playback: SlotPlayback,
    // [loop start, last tracked] region frames, keyed by source frame index.
    cache: [Option<(usize, RgbaImage)>; 2],
}

impl LoadedVideoHandle {
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn video(&self) -> &DecodedVideo {
        &self.video
    }

    /// Seconds of this clip played per cycle.
    pub fn playable_secs(&self) -> f64 {
        self.playable_secs
    }

    pub fn resource_path(&self) -> Option<&Path> {
        self.resource.path()
    }

    /// Source frame at `position`, cover-cropped to `width` x `height` and scaled to fit.
    pub(crate) fn region_frame(
        &mut self,
        position: f64,
        width: u32,
        height: u32,
    ) -> Option<&RgbaImage> {
        let idx = self.video.frame_index_at(position)?;
        let cell = usize::from(idx != 0);
        let hit = matches!(
            &self.cache[cell],
            Some((i, img)) if *i == idx && img.dimensions() == (width, height)
        );
        if !hit {
            let img = crop_to_region(&self.video.frames[idx], width, height);
            self.cache[cell] = Some((idx, img));
        }
        self.cache[cell].as_ref().map(|(_, img)| img)
    }

    /// Release the playback resource.
    pub(crate) fn release(self) {
        tracing::debug!(slot = self.slot, "releasing playback resource");
        self.resource.release();
    }
}

fn crop_to_region(src: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (sw, sh) = src.dimensions();
    if sw == 0 || sh == 0 {
        return RgbaImage::from_pixel(width, height, WHITE);
    }
    let crop = cover_crop(sw, sh, f64::from(width) / f64::from(height.max(1)));
    let x = (crop.x0.round() as u32).min(sw.saturating_sub(1));
    let y = (crop.y0.round() as u32).min(sh.saturating_sub(1));
    let cw = (crop.width().round() as u32).clamp(1, sw - x);
    let ch = (crop.height().round() as u32).clamp(1, sh - y);
    let view = imageops::crop_imm(src, x, y, cw, ch);
    if (cw, ch) == (width, height) {
        return view.to_image();
    }
    imageops::resize(&*view, width, height, FilterType::Triangle)
}

/// Clips worth loading, by slot: present, inside the layout, and plausible containers.
pub(crate) fn screen_candidates(clips: &[Option<Clip>], slot_count: usize) -> Vec<(usize, Clip)> {
    let mut out = Vec::new();
    for (slot, clip) in clips.iter().enumerate() {
        let Some(clip) = clip else {
            tracing::debug!(slot, "no clip for slot");
            continue;
        };
        if slot >= slot_count {
            tracing::warn!(slot, slot_count, "clip outside the layout ignored");
            continue;
        }
        if let Err(e) = check_container_plausibility(clip.data()) {
            tracing::warn!(slot, bytes = clip.size(), "skipping clip: {e}");
            continue;
        }
        out.push((slot, clip.clone()));
    }
    out
}

/// Per-load settings shared by every task.
#[derive(Clone, Debug)]
pub(crate) struct LoadSettings {
    pub scratch_dir: PathBuf,
    pub metadata_timeout: Duration,
    pub request: DecodeRequest,
    pub schedule: FrameSchedule,
}

/// Load every candidate concurrently. Failures are logged and dropped; survivors come back
/// sorted by slot.
pub(crate) async fn load_all(
    candidates: Vec<(usize, Clip)>,
    decoder: Arc<dyn VideoDecoder>,
    settings: LoadSettings,
) -> Vec<LoadedVideoHandle> {
    let mut set = JoinSet::new();
    for (slot, clip) in candidates {
        let decoder = decoder.clone();
        let settings = settings.clone();
        set.spawn(async move { (slot, load_one(slot, clip, decoder.as_ref(), &settings).await) });
    }

    let mut loaded = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((_, Ok(handle))) => loaded.push(handle),
            Ok((slot, Err(e))) if e.is_per_clip() => tracing::warn!(slot, "dropping clip: {e}"),
            Ok((slot, Err(e))) => tracing::error!(slot, "dropping clip after unexpected failure: {e}"),
            Err(e) => tracing::warn!("clip load task failed: {e}"),
        }
    }
    loaded.sort_by_key(|h| h.slot);
    loaded
}

async fn load_one(
    slot: usize,
    clip: Clip,
    decoder: &dyn VideoDecoder,
    settings: &LoadSettings,
) -> LivestripResult<LoadedVideoHandle> {
    let resource = PlaybackResource::create(&settings.scratch_dir, slot, &clip)?;
    let path = resource
        .path()
        .ok_or_else(|| LivestripError::clip_invalid("playback resource has no path"))?
        .to_path_buf();

    let video = tokio::time::timeout(
        settings.metadata_timeout,
        decoder.load(&path, settings.request),
    )
    .await
    .map_err(|_| LivestripError::MetadataTimeout {
        slot,
        timeout: settings.metadata_timeout,
    })??;

    if video.meta.width == 0 || video.meta.height == 0 {
        return Err(LivestripError::clip_invalid(format!(
            "slot {slot} has no video dimensions"
        )));
    }
    if video.frames.is_empty() {
        return Err(LivestripError::clip_invalid(format!(
            "slot {slot} decoded to zero frames"
        )));
    }

    let playable_secs = settings.schedule.playable_secs(Some(video.duration_secs()));
    tracing::info!(
        slot,
        width = video.meta.width,
        height = video.meta.height,
        frames = video.frames.len(),
        playable_secs,
        "clip loaded"
    );

    Ok(LoadedVideoHandle {
        slot,
        video,
        resource,
        playable_secs,
        playback: SlotPlayback::default(),
        cache: [None, None],
    })
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/loader.rs"]
mod tests;
