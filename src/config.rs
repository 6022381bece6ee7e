//! Runtime configuration.
//!
//! Every value has a default matching the photobooth's tuned constants, so an empty JSON object
//! (`{}`) is a complete configuration. Durations are written in milliseconds.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assets::media_type::MediaType;
use crate::foundation::core::Canvas;
use crate::foundation::debounce::Debounce;
use crate::foundation::error::{LivestripError, LivestripResult};

/// Top-level configuration for the session manager and the compositor.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LivestripConfig {
    /// Recording session settings.
    pub recorder: RecorderConfig,
    /// Compositor settings.
    pub compositor: CompositorConfig,
}

impl LivestripConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> LivestripResult<Self> {
        let cfg: Self = serde_json::from_str(text)
            .map_err(|e| LivestripError::validation(format!("config parse error: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> LivestripResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            LivestripError::validation(format!("read config '{}': {e}", path.display()))
        })?;
        Self::from_json(&text)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> LivestripResult<()> {
        self.recorder.validate()?;
        self.compositor.validate()
    }
}

/// Settings for [`crate::RecordingSessionManager`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecorderConfig {
    /// Recording media types in preference order.
    pub media_types: Vec<MediaType>,
    /// Chunk emission interval passed to the recorder.
    #[serde(with = "millis", rename = "timeslice_ms")]
    pub timeslice: Duration,
    /// Delay between the two final flush requests.
    #[serde(with = "millis", rename = "flush_delay_ms")]
    pub flush_delay: Duration,
    /// Delay between the second flush request and the stop request.
    #[serde(with = "millis", rename = "stop_delay_ms")]
    pub stop_delay: Duration,
    /// Grace period given to an abandoned recorder between its flush and stop.
    #[serde(with = "millis", rename = "abandon_stop_delay_ms")]
    pub abandon_stop_delay: Duration,
    /// Upper bound on waiting for the recorder's stop event.
    #[serde(with = "millis", rename = "stop_timeout_ms")]
    pub stop_timeout: Duration,
    /// Quiet window after the last chunk before the buffer counts as settled.
    #[serde(with = "millis", rename = "settle_quiet_ms")]
    pub settle_quiet: Duration,
    /// Minimum settle wait after the stop event.
    #[serde(with = "millis", rename = "settle_min_ms")]
    pub settle_min: Duration,
    /// Hard cap on the settle wait.
    #[serde(with = "millis", rename = "settle_cap_ms")]
    pub settle_cap: Duration,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            media_types: vec![
                MediaType::new("video/webm;codecs=vp8"),
                MediaType::new("video/webm;codecs=vp9"),
                MediaType::new("video/webm"),
            ],
            timeslice: Duration::from_millis(200),
            flush_delay: Duration::from_millis(300),
            stop_delay: Duration::from_millis(200),
            abandon_stop_delay: Duration::from_millis(50),
            stop_timeout: Duration::from_millis(5000),
            settle_quiet: Duration::from_millis(100),
            settle_min: Duration::from_millis(500),
            settle_cap: Duration::from_millis(2000),
        }
    }
}

impl RecorderConfig {
    /// Chunk-settle timer built from the `settle_*` fields.
    pub fn debounce(&self) -> Debounce {
        Debounce::new(self.settle_quiet, self.settle_min, self.settle_cap)
    }

    /// Check field constraints.
    pub fn validate(&self) -> LivestripResult<()> {
        if self.media_types.is_empty() {
            return Err(LivestripError::validation(
                "recorder.media_types must not be empty",
            ));
        }
        if self.timeslice.is_zero() {
            return Err(LivestripError::validation(
                "recorder.timeslice_ms must be > 0",
            ));
        }
        if self.settle_min > self.settle_cap {
            return Err(LivestripError::validation(
                "recorder.settle_min_ms must not exceed recorder.settle_cap_ms",
            ));
        }
        Ok(())
    }
}

/// Settings for [`crate::Compositor`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompositorConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frame rate.
    pub fps: u32,
    /// Target output bitrate in bits per second.
    pub bitrate: u32,
    /// Output media types in preference order.
    pub output_media_types: Vec<MediaType>,
    /// Per-clip metadata decode budget.
    #[serde(with = "millis", rename = "metadata_timeout_ms")]
    pub metadata_timeout: Duration,
    /// Loop timing.
    pub schedule: FrameSchedule,
    /// Directory for playback resources and encoder output. Defaults to the system temp dir.
    pub scratch_dir: Option<PathBuf>,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
            bitrate: 5_000_000,
            output_media_types: vec![
                MediaType::new("video/mp4"),
                MediaType::new("video/webm;codecs=vp9"),
                MediaType::new("video/webm"),
            ],
            metadata_timeout: Duration::from_millis(20_000),
            schedule: FrameSchedule::default(),
            scratch_dir: None,
        }
    }
}

impl CompositorConfig {
    /// Output canvas size.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Scratch directory in effect.
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Check field constraints.
    pub fn validate(&self) -> LivestripResult<()> {
        self.canvas().validate()?;
        if self.fps == 0 {
            return Err(LivestripError::validation("compositor.fps must be > 0"));
        }
        if self.bitrate == 0 {
            return Err(LivestripError::validation("compositor.bitrate must be > 0"));
        }
        if self.output_media_types.is_empty() {
            return Err(LivestripError::validation(
                "compositor.output_media_types must not be empty",
            ));
        }
        self.schedule.validate()
    }
}

/// Loop timing of the composite video.
///
/// One cycle plays each clip for `seconds_per_photo`, then holds the last reached frame for
/// `hold_secs`. The cycle repeats `loop_count` times, with `crossfade_secs` blends around the
/// boundaries between cycles.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrameSchedule {
    pub seconds_per_photo: f64,
    pub hold_secs: f64,
    pub loop_count: u32,
    pub crossfade_secs: f64,
}

impl Default for FrameSchedule {
    fn default() -> Self {
        Self {
            seconds_per_photo: 3.0,
            hold_secs: 2.0,
            loop_count: 3,
            crossfade_secs: 0.4,
        }
    }
}

impl FrameSchedule {
    /// Length of one loop cycle in seconds.
    pub fn cycle_secs(&self) -> f64 {
        self.seconds_per_photo + self.hold_secs
    }

    /// Total composite duration in seconds.
    pub fn total_secs(&self) -> f64 {
        self.cycle_secs() * f64::from(self.loop_count)
    }

    /// Check field constraints.
    pub fn validate(&self) -> LivestripResult<()> {
        if !self.seconds_per_photo.is_finite() || self.seconds_per_photo <= 0.0 {
            return Err(LivestripError::validation(
                "schedule.seconds_per_photo must be finite and > 0",
            ));
        }
        if !self.hold_secs.is_finite() || self.hold_secs < 0.0 {
            return Err(LivestripError::validation(
                "schedule.hold_secs must be finite and >= 0",
            ));
        }
        if self.loop_count == 0 {
            return Err(LivestripError::validation("schedule.loop_count must be > 0"));
        }
        if !self.crossfade_secs.is_finite()
            || self.crossfade_secs < 0.0
            || self.crossfade_secs * 2.0 > self.cycle_secs()
        {
            return Err(LivestripError::validation(
                "schedule.crossfade_secs must be >= 0 and at most half a cycle",
            ));
        }
        Ok(())
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
