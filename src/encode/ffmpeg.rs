use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::Context as _;
use image::RgbaImage;
use tempfile::TempPath;

use crate::assets::media_type::MediaType;
use crate::encode::sink::{EncoderConfig, FrameClock, VideoArtifact, VideoEncoder};
use crate::foundation::error::{LivestripError, LivestripResult};

/// Encoder that spawns the system `ffmpeg`, streams raw RGBA frames to its stdin and reads the
/// finished file back from a scratch location.
pub struct FfmpegEncoder {
    scratch_dir: PathBuf,
    run: Option<FfmpegRun>,
}

struct FfmpegRun {
    cfg: EncoderConfig,
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    output: TempPath,
    clock: FrameClock,
}

impl FfmpegEncoder {
    /// Encoder writing its intermediate output under `scratch_dir`.
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            run: None,
        }
    }
}

impl std::fmt::Debug for FfmpegEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegEncoder")
            .field("scratch_dir", &self.scratch_dir)
            .field("running", &self.run.is_some())
            .finish()
    }
}

const MP4_ARGS: &[&str] = &["-pix_fmt", "yuv420p", "-movflags", "+faststart", "-f", "mp4"];
const WEBM_ARGS: &[&str] = &["-pix_fmt", "yuv420p", "-deadline", "realtime", "-f", "webm"];

/// `ffmpeg` codec and output arguments for a media type, or `None` when no mapping exists.
fn codec_args(media_type: &MediaType) -> Option<(&'static str, &'static [&'static str])> {
    match (media_type.container(), media_type.codec()) {
        ("video/mp4", None | Some("avc1" | "h264")) => Some(("libx264", MP4_ARGS)),
        ("video/webm", Some("vp9")) => Some(("libvpx-vp9", WEBM_ARGS)),
        ("video/webm", None | Some("vp8")) => Some(("libvpx", WEBM_ARGS)),
        _ => None,
    }
}

/// Output of `ffmpeg -encoders`, probed once per process.
fn available_encoders() -> &'static str {
    static ENCODERS: OnceLock<String> = OnceLock::new();
    ENCODERS.get_or_init(|| {
        Command::new("ffmpeg")
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .ok()
            .filter(|o| o.status.success())
            .map(|o| String::from_utf8_lossy(&o.stdout).into_owned())
            .unwrap_or_default()
    })
}

fn has_encoder(name: &str) -> bool {
    available_encoders()
        .lines()
        .any(|l| l.split_whitespace().nth(1) == Some(name))
}

impl VideoEncoder for FfmpegEncoder {
    fn is_type_supported(&self, media_type: &MediaType) -> bool {
        codec_args(media_type).is_some_and(|(codec, _)| has_encoder(codec))
    }

    fn begin(&mut self, cfg: &EncoderConfig) -> LivestripResult<()> {
        cfg.validate()?;
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(LivestripError::validation(
                "ffmpeg encoder width/height must be even (required for yuv420p output)",
            ));
        }
        if self.run.is_some() {
            return Err(LivestripError::encoder("ffmpeg encoder already started"));
        }
        let (codec, extra) = codec_args(&cfg.media_type).ok_or_else(|| {
            LivestripError::encoder(format!("no ffmpeg codec for '{}'", cfg.media_type))
        })?;
        if !is_ffmpeg_on_path() {
            return Err(LivestripError::encoder(
                "ffmpeg is required for encoding, but was not found on PATH",
            ));
        }

        std::fs::create_dir_all(&self.scratch_dir).with_context(|| {
            format!("create scratch dir '{}'", self.scratch_dir.display())
        })?;
        let output = tempfile::Builder::new()
            .prefix("livestrip-out-")
            .suffix(&format!(".{}", cfg.media_type.extension()))
            .tempfile_in(&self.scratch_dir)
            .context("create encoder output file")?
            .into_temp_path();

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            codec,
            "-b:v",
            &cfg.bitrate.to_string(),
        ])
        .args(extra)
        .arg(&*output);

        let mut child = cmd.spawn().map_err(|e| {
            LivestripError::encoder(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| LivestripError::encoder("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| LivestripError::encoder("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        tracing::info!(media_type = %cfg.media_type, codec, width = cfg.width, height = cfg.height, fps = cfg.fps, "ffmpeg encoder started");
        self.run = Some(FfmpegRun {
            cfg: cfg.clone(),
            child,
            stdin: Some(stdin),
            stderr_drain: Some(stderr_drain),
            output,
            clock: FrameClock::new(cfg.fps),
        });
        Ok(())
    }

    fn push_frame(&mut self, at: Duration, frame: &RgbaImage) -> LivestripResult<()> {
        let run = self
            .run
            .as_mut()
            .ok_or_else(|| LivestripError::encoder("ffmpeg encoder not started"))?;
        run.cfg.check_frame(frame)?;
        let Some(stdin) = run.stdin.as_mut() else {
            return Err(LivestripError::encoder("ffmpeg encoder is already finalized"));
        };
        for _ in 0..run.clock.frames_due(at) {
            stdin.write_all(frame.as_raw()).map_err(|e| {
                LivestripError::encoder(format!("failed to write frame to ffmpeg stdin: {e}"))
            })?;
        }
        Ok(())
    }

    fn finish(&mut self) -> LivestripResult<VideoArtifact> {
        let mut run = self
            .run
            .take()
            .ok_or_else(|| LivestripError::encoder("ffmpeg encoder not started"))?;
        drop(run.stdin.take());

        let status = run.child.wait().map_err(|e| {
            LivestripError::encoder(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;
        let stderr_bytes = match run.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| LivestripError::encoder("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| LivestripError::encoder(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            return Err(LivestripError::encoder(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        let data = std::fs::read(&run.output).map_err(|e| {
            LivestripError::encoder(format!("failed to read encoded output: {e}"))
        })?;
        if data.is_empty() {
            return Err(LivestripError::encoder("ffmpeg produced an empty file"));
        }
        tracing::info!(bytes = data.len(), frames = run.clock.emitted(), "ffmpeg encoder finished");
        Ok(VideoArtifact {
            data,
            media_type: run.cfg.media_type,
        })
    }

    fn abort(&mut self) {
        let Some(mut run) = self.run.take() else {
            return;
        };
        drop(run.stdin.take());
        if let Err(e) = run.child.kill() {
            tracing::debug!("ffmpeg already exited: {e}");
        }
        let _ = run.child.wait();
        if let Some(handle) = run.stderr_drain.take() {
            let _ = handle.join();
        }
        tracing::warn!("ffmpeg encoder aborted");
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> LivestripResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
