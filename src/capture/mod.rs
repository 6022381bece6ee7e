//! Seams to the live camera: capture streams and the recorder backend bound to them.
//!
//! Acquiring the camera is left to the host. The session manager only needs to know whether a
//! stream has a live video track, and a backend that can create recorders for it.

use std::sync::Arc;
use std::time::Duration;

use crate::assets::media_type::MediaType;
use crate::foundation::error::LivestripResult;
use crate::session::RecorderEvents;

/// Readiness of one video track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackReadiness {
    Live,
    Ended,
}

/// A live video source owned by the camera collaborator.
pub trait CaptureStream: Send + Sync {
    /// Readiness of every video track on the stream.
    fn video_tracks(&self) -> Vec<TrackReadiness>;

    /// Return `true` if at least one video track is live.
    fn has_live_track(&self) -> bool {
        self.video_tracks().contains(&TrackReadiness::Live)
    }
}

/// Recorder activity as reported by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecorderState {
    Inactive,
    Recording,
    Paused,
}

/// Identity of one recorder instance within a session manager.
///
/// Ids increase monotonically, and every chunk and stop event carries the id of the instance
/// that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecorderId(pub u64);

impl std::fmt::Display for RecorderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rec#{}", self.0)
    }
}

/// Handle to one recorder instance.
///
/// Calls are non-blocking requests. Data, stop and error notifications arrive through the
/// [`RecorderEvents`] handle given to [`RecorderBackend::create`], possibly from other threads
/// and possibly synchronously from inside these calls.
pub trait Recorder: Send {
    fn state(&self) -> RecorderState;

    /// Begin recording, emitting a chunk every `timeslice`.
    fn start(&mut self, timeslice: Duration) -> LivestripResult<()>;

    /// Ask the recorder to emit whatever it has buffered.
    fn request_data(&mut self) -> LivestripResult<()>;

    /// Ask the recorder to stop. It emits its final chunk and then a stop event.
    fn stop(&mut self) -> LivestripResult<()>;
}

/// Factory for recorders bound to a capture stream.
pub trait RecorderBackend: Send + Sync {
    fn is_type_supported(&self, media_type: &MediaType) -> bool;

    fn create(
        &self,
        stream: Arc<dyn CaptureStream>,
        media_type: &MediaType,
        events: RecorderEvents,
    ) -> LivestripResult<Box<dyn Recorder>>;
}
