//! Live compositor.
//!
//! A [`job::CompositionJob`] goes through three stages: clips are screened and loaded
//! concurrently, the strip is rendered tick by tick into a [`crate::encode::VideoEncoder`], and the
//! encoder output is finalized into one artifact.

/// Job runner.
pub mod engine;
/// Job description, lifecycle and progress reporting.
pub mod job;
/// Strip and slot geometry.
pub mod layout;
/// Clip screening and concurrent loading.
pub mod loader;
/// Loop timing, crossfades and per-slot playback.
pub mod timeline;

pub use engine::Compositor;
pub use job::{CompositionJob, JobState, NoProgress, ProgressSink};
pub use layout::{StripLayout, cover_crop};
pub use loader::LoadedVideoHandle;
pub use timeline::{CrossfadeWeights, SlotPlayback, TickContext};
