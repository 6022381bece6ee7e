//! Recorded material: validated clips, media types, playback resources and the decoder seam.

/// Validated clips and container plausibility checks.
pub mod clip;
/// Decoder trait and the `ffprobe`/`ffmpeg` implementation.
pub mod media;
/// MIME-style media types and preference selection.
pub mod media_type;
/// Scratch-file playback resources.
pub mod resource;
