//! livestrip records one short clip per photobooth shot and composites the clips into a looping,
//! cross-faded photo-strip video.
//!
//! The public API has two halves:
//!
//! - A [`RecordingSessionManager`] drives a capture-bound recorder, one session per shot, and
//!   drains each session into a validated [`Clip`]
//! - A [`Compositor`] runs a [`CompositionJob`] over those clips and streams the rendered strip
//!   into a [`VideoEncoder`]
#![forbid(unsafe_code)]

/// Recorded material: clips, media types, playback resources and decoding.
pub mod assets;
/// Capture stream and recorder seams.
pub mod capture;
/// The live compositor.
pub mod compositor;
/// Serde-backed configuration.
pub mod config;
/// Blending, filters and decorations.
pub mod effects;
/// Output encoders.
pub mod encode;
/// Shared primitives and the error taxonomy.
pub mod foundation;
/// Recorder session management.
pub mod session;

pub use crate::assets::clip::Clip;
pub use crate::assets::media::{DecodeRequest, DecodedVideo, FfmpegDecoder, VideoDecoder, VideoMeta};
pub use crate::assets::media_type::MediaType;
pub use crate::capture::{
    CaptureStream, Recorder, RecorderBackend, RecorderId, RecorderState, TrackReadiness,
};
pub use crate::compositor::{
    CompositionJob, Compositor, JobState, NoProgress, ProgressSink, StripLayout,
};
pub use crate::config::{CompositorConfig, FrameSchedule, LivestripConfig, RecorderConfig};
pub use crate::effects::decorations::{Decorator, NoDecorations, RetroDecorator};
pub use crate::effects::filters::{Filter, FilterKind, RetroFilter};
pub use crate::encode::{
    EncoderConfig, FfmpegEncoder, InMemoryEncoder, VideoArtifact, VideoEncoder,
};
pub use crate::foundation::core::Canvas;
pub use crate::foundation::error::{LivestripError, LivestripResult};
pub use crate::session::{
    RecorderEvents, RecordingSessionManager, SessionState, StartOutcome,
};
