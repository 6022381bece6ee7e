use std::time::Duration;

use image::RgbaImage;

use crate::assets::media_type::MediaType;
use crate::foundation::error::{LivestripError, LivestripResult};

/// Configuration handed to a [`VideoEncoder`] when rendering begins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Target video bitrate in bits per second.
    pub bitrate: u32,
    /// Output container/codec, already checked with [`VideoEncoder::is_type_supported`].
    pub media_type: MediaType,
}

impl EncoderConfig {
    pub fn validate(&self) -> LivestripResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(LivestripError::validation(
                "encoder width/height must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(LivestripError::validation("encoder fps must be non-zero"));
        }
        Ok(())
    }

    pub fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    /// Reject frames whose size or buffer length does not match this configuration.
    pub fn check_frame(&self, frame: &RgbaImage) -> LivestripResult<()> {
        if frame.dimensions() != (self.width, self.height)
            || frame.as_raw().len() != self.frame_bytes()
        {
            return Err(LivestripError::encoder(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }
}

/// Finished composite: one encoded blob and its declared media type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoArtifact {
    pub data: Vec<u8>,
    pub media_type: MediaType,
}

impl VideoArtifact {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Frame sink that turns timestamped canvas snapshots into one encoded video.
///
/// Call order: `begin`, any number of `push_frame` with non-decreasing `at`, then exactly one
/// of `finish` or `abort`. `abort` may also follow a failed `finish` and must be harmless when
/// nothing was started.
pub trait VideoEncoder: Send {
    fn is_type_supported(&self, media_type: &MediaType) -> bool;

    fn begin(&mut self, cfg: &EncoderConfig) -> LivestripResult<()>;

    /// Submit the canvas as it looks `at` after rendering began. The encoder maps timestamps
    /// onto its constant frame rate, repeating or dropping frames as needed.
    fn push_frame(&mut self, at: Duration, frame: &RgbaImage) -> LivestripResult<()>;

    fn finish(&mut self) -> LivestripResult<VideoArtifact>;

    fn abort(&mut self);
}

/// Maps wall-clock timestamps to constant-rate output frame counts.
#[derive(Clone, Copy, Debug)]
pub struct FrameClock {
    fps: u32,
    emitted: u64,
}

impl FrameClock {
    pub fn new(fps: u32) -> Self {
        Self { fps, emitted: 0 }
    }

    /// Number of times a frame submitted at `at` must be written so output time catches up
    /// with `at`. Zero when the encoder is already ahead (the frame is dropped).
    pub fn frames_due(&mut self, at: Duration) -> u64 {
        let target = (at.as_secs_f64() * f64::from(self.fps) + 1e-6).floor() as u64 + 1;
        let due = target.saturating_sub(self.emitted);
        self.emitted += due;
        due
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

/// In-memory encoder for tests and debugging.
///
/// Keeps every submitted frame; the artifact is the concatenated raw RGBA of the constant-rate
/// output, so keep canvases small.
#[derive(Debug)]
pub struct InMemoryEncoder {
    supported: Vec<MediaType>,
    fail_at: Option<usize>,
    cfg: Option<EncoderConfig>,
    clock: Option<FrameClock>,
    /// Submitted frames with their timestamps.
    pub frames: Vec<(Duration, RgbaImage)>,
    /// Output frame count after constant-rate mapping.
    pub output_frames: u64,
    pub finished: bool,
    pub aborted: bool,
    data: Vec<u8>,
}

impl Default for InMemoryEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEncoder {
    /// Encoder that accepts every media type.
    pub fn new() -> Self {
        Self {
            supported: Vec::new(),
            fail_at: None,
            cfg: None,
            clock: None,
            frames: Vec::new(),
            output_frames: 0,
            finished: false,
            aborted: false,
            data: Vec::new(),
        }
    }

    /// Only accept the listed media types.
    pub fn supporting(mut self, types: impl IntoIterator<Item = MediaType>) -> Self {
        self.supported = types.into_iter().collect();
        self
    }

    /// Fail the `n`th `push_frame` call (zero-based).
    pub fn failing_at(mut self, n: usize) -> Self {
        self.fail_at = Some(n);
        self
    }

    pub fn config(&self) -> Option<&EncoderConfig> {
        self.cfg.as_ref()
    }

    pub fn began(&self) -> bool {
        self.cfg.is_some()
    }

    pub fn last_frame(&self) -> Option<&RgbaImage> {
        self.frames.last().map(|(_, f)| f)
    }
}

impl VideoEncoder for InMemoryEncoder {
    fn is_type_supported(&self, media_type: &MediaType) -> bool {
        self.supported.is_empty() || self.supported.contains(media_type)
    }

    fn begin(&mut self, cfg: &EncoderConfig) -> LivestripResult<()> {
        cfg.validate()?;
        self.cfg = Some(cfg.clone());
        self.clock = Some(FrameClock::new(cfg.fps));
        self.frames.clear();
        self.data.clear();
        self.output_frames = 0;
        Ok(())
    }

    fn push_frame(&mut self, at: Duration, frame: &RgbaImage) -> LivestripResult<()> {
        let (Some(cfg), Some(clock)) = (self.cfg.as_ref(), self.clock.as_mut()) else {
            return Err(LivestripError::encoder("in-memory encoder not started"));
        };
        if self.fail_at == Some(self.frames.len()) {
            return Err(LivestripError::encoder(format!(
                "injected failure at frame {}",
                self.frames.len()
            )));
        }
        cfg.check_frame(frame)?;
        let due = clock.frames_due(at);
        self.data.reserve(cfg.frame_bytes() * due as usize);
        for _ in 0..due {
            self.data.extend_from_slice(frame.as_raw());
        }
        self.output_frames += due;
        self.frames.push((at, frame.clone()));
        Ok(())
    }

    fn finish(&mut self) -> LivestripResult<VideoArtifact> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| LivestripError::encoder("in-memory encoder not started"))?;
        self.finished = true;
        Ok(VideoArtifact {
            data: std::mem::take(&mut self.data),
            media_type: cfg.media_type.clone(),
        })
    }

    fn abort(&mut self) {
        self.aborted = true;
        self.data.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
