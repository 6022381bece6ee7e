use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use rayon::prelude::*;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::time::{Instant, MissedTickBehavior};

use crate::assets::media::{DecodeRequest, VideoDecoder};
use crate::assets::media_type::pick_supported;
use crate::compositor::job::{CompositionJob, JobState, ProgressReporter};
use crate::compositor::layout::StripLayout;
use crate::compositor::loader::{LoadSettings, LoadedVideoHandle, load_all, screen_candidates};
use crate::compositor::timeline::{CrossfadeWeights, MIN_LAYER_WEIGHT, TickContext};
use crate::config::CompositorConfig;
use crate::effects::composite::over_in_place;
use crate::effects::decorations::{Decorator, RetroDecorator};
use crate::effects::filters::{Filter, FilterKind, RetroFilter};
use crate::encode::sink::{EncoderConfig, VideoArtifact, VideoEncoder};
use crate::foundation::core::{BLACK, PixelRect, WHITE};
use crate::foundation::error::{LivestripError, LivestripResult};

/// Live compositor: loads the job's clips, renders the looping strip tick by tick and hands
/// every tick's canvas to a [`VideoEncoder`].
#[derive(Clone)]
pub struct Compositor {
    cfg: CompositorConfig,
    decoder: Arc<dyn VideoDecoder>,
    filter: Arc<dyn Filter>,
    decorator: Arc<dyn Decorator>,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("cfg", &self.cfg)
            .finish_non_exhaustive()
    }
}

/// Per-job values fixed before rendering starts.
struct RenderPlan<'a> {
    layout: StripLayout,
    filter: FilterKind,
    caption: Option<&'a str>,
    encoder_cfg: EncoderConfig,
}

impl Compositor {
    /// Compositor with the retro filter and decorations.
    pub fn new(cfg: CompositorConfig, decoder: Arc<dyn VideoDecoder>) -> Self {
        Self {
            cfg,
            decoder,
            filter: Arc::new(RetroFilter),
            decorator: Arc::new(RetroDecorator),
        }
    }

    pub fn with_filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_decorator(mut self, decorator: Arc<dyn Decorator>) -> Self {
        self.decorator = decorator;
        self
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.cfg
    }

    /// Run one job to completion.
    ///
    /// Per-clip failures are logged and the slot is left empty. The job fails with
    /// [`LivestripError::NoUsableMaterial`] when no clip survives loading, before the canvas or
    /// the encoder is touched, and with [`LivestripError::EncoderFailure`] when the encoder
    /// reports an error. Playback resources are released on every path.
    #[tracing::instrument(skip_all, fields(slots = job.slot_count, filter = %job.filter))]
    pub async fn run(
        &self,
        job: CompositionJob,
        encoder: &mut dyn VideoEncoder,
    ) -> LivestripResult<VideoArtifact> {
        let CompositionJob {
            clips,
            slot_count,
            filter,
            caption,
            progress,
        } = job;
        let mut reporter = ProgressReporter::new(progress);
        reporter.enter(JobState::Loading);

        let result = self
            .run_stages(&clips, slot_count, filter, caption.as_deref(), encoder, &mut reporter)
            .await;
        match result {
            Ok(artifact) => {
                reporter.enter(JobState::Resolved);
                tracing::info!(
                    bytes = artifact.len(),
                    media_type = %artifact.media_type,
                    "composition resolved"
                );
                Ok(artifact)
            }
            Err(e) => {
                let stage = reporter.state();
                encoder.abort();
                reporter.enter(JobState::Rejected);
                tracing::error!(?stage, "composition rejected: {e}");
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        clips: &[Option<crate::assets::clip::Clip>],
        slot_count: usize,
        filter: FilterKind,
        caption: Option<&str>,
        encoder: &mut dyn VideoEncoder,
        reporter: &mut ProgressReporter,
    ) -> LivestripResult<VideoArtifact> {
        self.cfg.validate()?;

        let candidates = screen_candidates(clips, slot_count);
        if candidates.is_empty() {
            tracing::warn!(clips = clips.len(), "no clip passed screening");
            return Err(LivestripError::NoUsableMaterial);
        }
        reporter.report(10);

        let layout = StripLayout::new(slot_count, self.cfg.canvas());
        let fit = layout.slots.first().map(|r| {
            let px = PixelRect::snap(*r, self.cfg.width, self.cfg.height);
            (px.width.max(1), px.height.max(1))
        });
        let settings = LoadSettings {
            scratch_dir: self.cfg.scratch_dir(),
            metadata_timeout: self.cfg.metadata_timeout,
            request: DecodeRequest {
                fps: self.cfg.fps,
                max_secs: self.cfg.schedule.seconds_per_photo,
                fit,
            },
            schedule: self.cfg.schedule,
        };
        let mut handles = load_all(candidates, self.decoder.clone(), settings).await;
        if handles.is_empty() {
            tracing::warn!("no clip survived loading");
            return Err(LivestripError::NoUsableMaterial);
        }
        tracing::info!(
            loaded = handles.len(),
            slots = ?handles.iter().map(LoadedVideoHandle::slot).collect::<Vec<_>>(),
            "clips loaded"
        );
        reporter.report(20);

        let plan = match pick_supported(&self.cfg.output_media_types, |m| {
            encoder.is_type_supported(m)
        }) {
            Some(media_type) => RenderPlan {
                layout,
                filter,
                caption,
                encoder_cfg: EncoderConfig {
                    width: self.cfg.width,
                    height: self.cfg.height,
                    fps: self.cfg.fps,
                    bitrate: self.cfg.bitrate,
                    media_type: media_type.clone(),
                },
            },
            None => {
                release_all(handles);
                return Err(LivestripError::unsupported_codec(
                    &self.cfg.output_media_types,
                ));
            }
        };

        reporter.enter(JobState::Rendering);
        let rendered = self.render(&plan, &mut handles, encoder, reporter).await;
        release_all(handles);
        rendered?;
        reporter.report(95);

        reporter.enter(JobState::Finalizing);
        let artifact = offload(|| encoder.finish()).map_err(as_encoder_failure)?;
        reporter.report(100);
        Ok(artifact)
    }

    async fn render(
        &self,
        plan: &RenderPlan<'_>,
        handles: &mut [LoadedVideoHandle],
        encoder: &mut dyn VideoEncoder,
        reporter: &mut ProgressReporter,
    ) -> LivestripResult<()> {
        let mut canvas = self.cfg.canvas().allocate(BLACK);
        encoder
            .begin(&plan.encoder_cfg)
            .map_err(as_encoder_failure)?;
        reporter.report(30);

        let schedule = self.cfg.schedule;
        let period = Duration::from_nanos(1_000_000_000 / u64::from(self.cfg.fps.max(1)));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let start = Instant::now();
        let mut ticks = 0u64;

        loop {
            interval.tick().await;
            let elapsed = start.elapsed();
            let tick = schedule.tick(elapsed.as_secs_f64());
            reporter.report(tick.progress);
            if tick.finished {
                break;
            }
            offload(|| {
                self.render_tick(&mut canvas, plan, &mut *handles, &tick)?;
                encoder
                    .push_frame(elapsed, &canvas)
                    .map_err(as_encoder_failure)
            })?;
            ticks += 1;
        }

        tracing::info!(ticks, secs = schedule.total_secs(), "rendering complete");
        Ok(())
    }

    /// Draw one tick into `canvas`: background, slot frames (cross-faded and filtered), then
    /// slot and strip decorations.
    fn render_tick(
        &self,
        canvas: &mut RgbaImage,
        plan: &RenderPlan<'_>,
        handles: &mut [LoadedVideoHandle],
        tick: &TickContext,
    ) -> LivestripResult<()> {
        let schedule = &self.cfg.schedule;
        let layout = &plan.layout;
        let scale = layout.scale;
        let (cw, ch) = canvas.dimensions();

        self.decorator.draw_background(canvas, layout.strip, scale);

        let weights = schedule.crossfade(tick);
        let filter = self.filter.as_ref();
        let regions = handles
            .par_iter_mut()
            .filter_map(|handle| {
                handle.playback = handle
                    .playback
                    .advance(tick, handle.playable_secs(), schedule);
                let rect = layout.slots.get(handle.slot())?;
                let px = PixelRect::snap(*rect, cw, ch);
                if px.is_empty() {
                    return None;
                }
                Some(compose_slot(handle, px, weights, plan.filter, filter).map(|buf| (px, buf)))
            })
            .collect::<LivestripResult<Vec<_>>>()?;

        for (px, buf) in &regions {
            image::imageops::replace(canvas, buf, i64::from(px.x), i64::from(px.y));
        }

        let n = layout.slot_count();
        for (i, region) in layout.slots.iter().enumerate() {
            self.decorator.draw_slot(canvas, *region, i, n, scale);
        }
        self.decorator.draw_strip(canvas, layout.strip, plan.caption, scale);
        tracing::trace!(elapsed = tick.elapsed, loop_index = tick.loop_index, "tick rendered");
        Ok(())
    }
}

/// Render one slot region on white: the loop-start layer inside a crossfade window, then the
/// frame at the slot's tracked position, then the filter.
fn compose_slot(
    handle: &mut LoadedVideoHandle,
    px: PixelRect,
    weights: Option<CrossfadeWeights>,
    kind: FilterKind,
    filter: &dyn Filter,
) -> LivestripResult<RgbaImage> {
    let mut buf = RgbaImage::from_pixel(px.width, px.height, WHITE);

    let current = match weights {
        Some(w) => {
            if w.loop_start > MIN_LAYER_WEIGHT
                && let Some(src) = handle.region_frame(0.0, px.width, px.height)
            {
                over_in_place(&mut buf, src, w.loop_start)?;
            }
            w.current
        }
        None => 1.0,
    };
    if current > MIN_LAYER_WEIGHT {
        let position = handle.playback.position;
        if let Some(src) = handle.region_frame(position, px.width, px.height) {
            over_in_place(&mut buf, src, current)?;
        }
    }

    filter.apply(&mut buf, px.width, px.height, kind);
    Ok(buf)
}

fn release_all(handles: Vec<LoadedVideoHandle>) {
    for handle in handles {
        handle.release();
    }
}

/// Run CPU-bound or blocking work so it does not stall other tasks on a multi-threaded
/// runtime. On a current-thread runtime the work runs inline.
fn offload<R>(work: impl FnOnce() -> R) -> R {
    match Handle::try_current().map(|h| h.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(work),
        _ => work(),
    }
}

fn as_encoder_failure(e: LivestripError) -> LivestripError {
    match e {
        e @ LivestripError::EncoderFailure(_) => e,
        other => LivestripError::encoder(other.to_string()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/engine.rs"]
mod tests;
