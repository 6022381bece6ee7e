//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use image::{Rgba, RgbaImage};
use livestrip::{
    CaptureStream, DecodeRequest, DecodedVideo, LivestripError, LivestripResult, MediaType,
    Recorder, RecorderBackend, RecorderEvents, RecorderId, RecorderState, TrackReadiness,
    VideoDecoder, VideoMeta,
};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

/// Capture stream with a single video track.
#[derive(Debug)]
pub struct FakeStream {
    pub live: bool,
}

impl FakeStream {
    pub fn live() -> Arc<dyn CaptureStream> {
        Arc::new(Self { live: true })
    }

    pub fn ended() -> Arc<dyn CaptureStream> {
        Arc::new(Self { live: false })
    }
}

impl CaptureStream for FakeStream {
    fn video_tracks(&self) -> Vec<TrackReadiness> {
        if self.live {
            vec![TrackReadiness::Live]
        } else {
            vec![TrackReadiness::Ended]
        }
    }
}

/// Recorder backend whose recorders emit chunks filled with their own id byte.
#[derive(Debug)]
pub struct SyntheticBackend {
    /// Accepted media types; empty accepts everything.
    pub supported: Vec<MediaType>,
    pub chunk_size: usize,
    /// Delay between `stop()` and the stop event.
    pub stop_latency: Duration,
    /// `stop()` returns an error.
    pub fail_stop: bool,
    /// `stop()` never reports a stop event.
    pub silent_stop: bool,
    /// `request_data()` returns an error.
    pub fail_request_data: bool,
    pub created: Mutex<Vec<RecorderId>>,
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self {
            supported: Vec::new(),
            chunk_size: 30_000,
            stop_latency: Duration::from_millis(20),
            fail_stop: false,
            silent_stop: false,
            fail_request_data: false,
            created: Mutex::new(Vec::new()),
        }
    }
}

impl RecorderBackend for SyntheticBackend {
    fn is_type_supported(&self, media_type: &MediaType) -> bool {
        self.supported.is_empty() || self.supported.contains(media_type)
    }

    fn create(
        &self,
        _stream: Arc<dyn CaptureStream>,
        _media_type: &MediaType,
        events: RecorderEvents,
    ) -> LivestripResult<Box<dyn Recorder>> {
        self.created.lock().push(events.id());
        Ok(Box::new(SyntheticRecorder {
            state: Arc::new(Mutex::new(RecorderState::Inactive)),
            events,
            chunk_size: self.chunk_size,
            stop_latency: self.stop_latency,
            fail_stop: self.fail_stop,
            silent_stop: self.silent_stop,
            fail_request_data: self.fail_request_data,
            emitter: None,
        }))
    }
}

struct SyntheticRecorder {
    state: Arc<Mutex<RecorderState>>,
    events: RecorderEvents,
    chunk_size: usize,
    stop_latency: Duration,
    fail_stop: bool,
    silent_stop: bool,
    fail_request_data: bool,
    emitter: Option<JoinHandle<()>>,
}

impl SyntheticRecorder {
    fn chunk(&self) -> Vec<u8> {
        vec![self.events.id().0 as u8; self.chunk_size]
    }
}

impl Recorder for SyntheticRecorder {
    fn state(&self) -> RecorderState {
        *self.state.lock()
    }

    fn start(&mut self, timeslice: Duration) -> LivestripResult<()> {
        *self.state.lock() = RecorderState::Recording;
        let state = self.state.clone();
        let events = self.events.clone();
        let chunk = self.chunk();
        self.emitter = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + timeslice, timeslice);
            loop {
                interval.tick().await;
                if *state.lock() != RecorderState::Recording {
                    break;
                }
                events.data_available(chunk.clone());
            }
        }));
        Ok(())
    }

    fn request_data(&mut self) -> LivestripResult<()> {
        if self.fail_request_data {
            return Err(LivestripError::Other(anyhow::anyhow!("encoder flush rejected")));
        }
        if self.state() == RecorderState::Recording {
            self.events.data_available(self.chunk());
        }
        Ok(())
    }

    fn stop(&mut self) -> LivestripResult<()> {
        if self.fail_stop {
            return Err(LivestripError::Other(anyhow::anyhow!("device lost")));
        }
        if self.state() == RecorderState::Inactive {
            return Ok(());
        }
        *self.state.lock() = RecorderState::Inactive;
        if let Some(emitter) = self.emitter.take() {
            emitter.abort();
        }
        self.events.data_available(self.chunk());
        if self.silent_stop {
            return Ok(());
        }
        if self.stop_latency.is_zero() {
            self.events.stopped();
        } else {
            let events = self.events.clone();
            let latency = self.stop_latency;
            tokio::spawn(async move {
                tokio::time::sleep(latency).await;
                events.stopped();
            });
        }
        Ok(())
    }
}

impl Drop for SyntheticRecorder {
    fn drop(&mut self) {
        if let Some(emitter) = self.emitter.take() {
            emitter.abort();
        }
    }
}

/// Solid colour for a clip whose payload starts with `shade`.
pub fn shade_color(shade: u8) -> Rgba<u8> {
    Rgba([shade, 255 - shade, shade / 2, 255])
}

/// Decoder producing solid 64x48 frames coloured by the clip's first byte.
#[derive(Debug, Default)]
pub struct SyntheticDecoder {
    /// Load delay keyed by first payload byte.
    pub delays: HashMap<u8, Duration>,
    /// Declared clip duration; `None` mimics streamed output without one.
    pub duration_secs: Option<f64>,
}

impl SyntheticDecoder {
    pub fn new() -> Self {
        Self {
            delays: HashMap::new(),
            duration_secs: Some(3.0),
        }
    }

    pub fn with_delay(mut self, shade: u8, delay: Duration) -> Self {
        self.delays.insert(shade, delay);
        self
    }
}

#[async_trait::async_trait]
impl VideoDecoder for SyntheticDecoder {
    async fn load(&self, path: &Path, req: DecodeRequest) -> LivestripResult<DecodedVideo> {
        let bytes = std::fs::read(path).map_err(|e| LivestripError::decode(e.to_string()))?;
        let shade = bytes.first().copied().unwrap_or(0);
        if let Some(delay) = self.delays.get(&shade) {
            tokio::time::sleep(*delay).await;
        }
        let secs = self.duration_secs.unwrap_or(3.0).min(req.max_secs);
        let count = ((secs * f64::from(req.fps)).ceil() as usize).max(1);
        Ok(DecodedVideo {
            meta: VideoMeta {
                width: 64,
                height: 48,
                duration_secs: self.duration_secs,
            },
            fps: req.fps,
            frames: vec![RgbaImage::from_pixel(64, 48, shade_color(shade)); count],
        })
    }
}

/// Clip payload of `len` bytes filled with `shade`.
pub fn shaded_clip(shade: u8, len: usize) -> livestrip::Clip {
    livestrip::Clip::from_payload(vec![shade; len], MediaType::new("video/webm"))
}
