//! Output encoding.
//!
//! The compositor submits timestamped canvas snapshots to a [`sink::VideoEncoder`]; encoders map
//! them onto a constant frame rate and produce one [`sink::VideoArtifact`].

/// `ffmpeg`-backed encoder.
pub mod ffmpeg;
/// Encoder contract, frame clock and in-memory encoder.
pub mod sink;

pub use ffmpeg::{FfmpegEncoder, ensure_parent_dir, is_ffmpeg_on_path};
pub use sink::{EncoderConfig, FrameClock, InMemoryEncoder, VideoArtifact, VideoEncoder};
