use std::path::Path;
use std::process::Stdio;

use image::RgbaImage;
use tokio::process::Command;

use crate::foundation::error::{LivestripError, LivestripResult};

/// Basic metadata about a decoded clip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoMeta {
    /// Source width in pixels.
    pub width: u32,
    /// Source height in pixels.
    pub height: u32,
    /// Container duration in seconds, when the container declares one.
    ///
    /// Streamed recorder output often carries no duration.
    pub duration_secs: Option<f64>,
}

/// Parameters for [`VideoDecoder::load`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodeRequest {
    /// Frame rate frames are sampled at.
    pub fps: u32,
    /// Seconds of material to decode from the start.
    pub max_secs: f64,
    /// Optional bounding size. Frames larger than it on both axes are downscaled, preserving
    /// aspect ratio, until one axis matches.
    pub fit: Option<(u32, u32)>,
}

/// Decoded clip: metadata plus frames sampled at a constant rate from time zero.
#[derive(Clone, Debug)]
pub struct DecodedVideo {
    pub meta: VideoMeta,
    pub fps: u32,
    pub frames: Vec<RgbaImage>,
}

impl DecodedVideo {
    /// Playable length in seconds: the declared duration or, failing that, the decoded span.
    pub fn duration_secs(&self) -> f64 {
        match self.meta.duration_secs {
            Some(d) if d.is_finite() && d > 0.0 => d,
            _ => self.frames.len() as f64 / f64::from(self.fps.max(1)),
        }
    }

    /// Index of the frame shown at playback position `t` seconds, clamped to the decoded range.
    pub fn frame_index_at(&self, t: f64) -> Option<usize> {
        let last = self.frames.len().checked_sub(1)?;
        Some(((t.max(0.0) * f64::from(self.fps)).floor() as usize).min(last))
    }
}

/// Loads a clip file into decoded frames.
#[async_trait::async_trait]
pub trait VideoDecoder: Send + Sync {
    /// Decode `path`. Implementations must fail with a positive-dimension check rather than
    /// return empty frames.
    async fn load(&self, path: &Path, req: DecodeRequest) -> LivestripResult<DecodedVideo>;
}

/// Decoder backed by the system `ffprobe` and `ffmpeg`.
///
/// Child processes are killed if the load future is dropped.
#[derive(Clone, Debug, Default)]
pub struct FfmpegDecoder;

impl FfmpegDecoder {
    pub fn new() -> Self {
        Self
    }

    async fn probe(&self, path: &Path) -> LivestripResult<VideoMeta> {
        #[derive(serde::Deserialize)]
        struct ProbeStream {
            codec_type: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
            duration: Option<String>,
        }
        #[derive(serde::Deserialize)]
        struct ProbeFormat {
            duration: Option<String>,
        }
        #[derive(serde::Deserialize)]
        struct ProbeOut {
            streams: Vec<ProbeStream>,
            format: Option<ProbeFormat>,
        }

        let out = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| LivestripError::decode(format!("failed to run ffprobe: {e}")))?;
        if !out.status.success() {
            return Err(LivestripError::decode(format!(
                "ffprobe failed for '{}': {}",
                path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
            .map_err(|e| LivestripError::decode(format!("ffprobe json parse failed: {e}")))?;
        let stream = parsed
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| LivestripError::decode("no video stream found"))?;
        let width = stream.width.unwrap_or(0);
        let height = stream.height.unwrap_or(0);
        if width == 0 || height == 0 {
            return Err(LivestripError::decode(format!(
                "video stream has no usable dimensions ({width}x{height})"
            )));
        }

        let duration_secs = stream
            .duration
            .as_deref()
            .or(parsed.format.as_ref().and_then(|f| f.duration.as_deref()))
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0);

        Ok(VideoMeta {
            width,
            height,
            duration_secs,
        })
    }
}

#[async_trait::async_trait]
impl VideoDecoder for FfmpegDecoder {
    #[tracing::instrument(skip(self, path), fields(path = %path.display()))]
    async fn load(&self, path: &Path, req: DecodeRequest) -> LivestripResult<DecodedVideo> {
        if req.fps == 0 {
            return Err(LivestripError::validation("decode fps must be non-zero"));
        }
        let meta = self.probe(path).await?;
        let (out_w, out_h) = fit_dims(meta.width, meta.height, req.fit);

        let out = Command::new("ffmpeg")
            .args(["-v", "error", "-i"])
            .arg(path)
            .args([
                "-an",
                "-t",
                &format!("{:.3}", req.max_secs.max(0.0)),
                "-vf",
                &format!("fps={},scale={out_w}:{out_h}", req.fps),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| LivestripError::decode(format!("failed to run ffmpeg for decode: {e}")))?;
        if !out.status.success() {
            return Err(LivestripError::decode(format!(
                "ffmpeg decode failed for '{}': {}",
                path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let frame_len = out_w as usize * out_h as usize * 4;
        if out.stdout.len() < frame_len {
            return Err(LivestripError::decode(format!(
                "ffmpeg returned no video frames for '{}'",
                path.display()
            )));
        }
        let frames: Vec<RgbaImage> = out
            .stdout
            .chunks_exact(frame_len)
            .filter_map(|chunk| RgbaImage::from_raw(out_w, out_h, chunk.to_vec()))
            .collect();
        tracing::debug!(
            width = meta.width,
            height = meta.height,
            frames = frames.len(),
            duration = ?meta.duration_secs,
            "decoded clip"
        );

        Ok(DecodedVideo {
            meta,
            fps: req.fps,
            frames,
        })
    }
}

/// Output dimensions for a `w` x `h` source under an optional bounding size. Never upscales.
pub(crate) fn fit_dims(w: u32, h: u32, fit: Option<(u32, u32)>) -> (u32, u32) {
    let Some((fw, fh)) = fit else {
        return (w, h);
    };
    if fw == 0 || fh == 0 {
        return (w, h);
    }
    // Cover the bound: the larger of the two ratios keeps both axes at or above it.
    let k = (f64::from(fw) / f64::from(w))
        .max(f64::from(fh) / f64::from(h))
        .min(1.0);
    let out_w = ((f64::from(w) * k).round() as u32).max(1);
    let out_h = ((f64::from(h) * k).round() as u32).max(1);
    (out_w, out_h)
}

/// Return `true` when `ffprobe` can be invoked from `PATH`.
pub fn is_ffprobe_on_path() -> bool {
    std::process::Command::new("ffprobe")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
