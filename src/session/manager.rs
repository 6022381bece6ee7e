use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::assets::clip::Clip;
use crate::assets::media_type::{MediaType, pick_supported};
use crate::capture::{CaptureStream, Recorder, RecorderBackend, RecorderId, RecorderState};
use crate::config::RecorderConfig;
use crate::foundation::debounce::Settled;
use crate::foundation::error::{LivestripError, LivestripResult};
use crate::session::events::{BufferSignal, EventCore, RecorderEvents};
use crate::session::state::{SessionEvent, SessionState};

/// Result of [`RecordingSessionManager::start`].
#[derive(Debug)]
pub enum StartOutcome {
    /// A new recorder is running.
    Started {
        recorder: RecorderId,
        media_type: MediaType,
    },
    /// Nothing was started. The error says why; it has already been logged.
    Skipped(LivestripError),
}

impl StartOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, StartOutcome::Started { .. })
    }
}

struct ActiveRecorder {
    id: RecorderId,
    media_type: MediaType,
    handle: Box<dyn Recorder>,
}

/// Owns the single recorder bound to the capture stream across a sequence of shots.
///
/// One shot is `start`, then `extract_clip` (optionally preceded by `stop`). Extraction and
/// start are serialized by an internal gate: `start` never replaces a recorder whose extraction
/// is still settling, and a second `extract_clip` waits for the first.
///
/// Locking: `recorder` may be held while `core` is taken, never the reverse. Recorder callbacks
/// lock `core` synchronously, possibly from inside a `Recorder` method. No lock is held across
/// an await point.
pub struct RecordingSessionManager {
    backend: Arc<dyn RecorderBackend>,
    cfg: RecorderConfig,
    recorder: Mutex<Option<ActiveRecorder>>,
    core: Arc<Mutex<EventCore>>,
    extraction: tokio::sync::Mutex<()>,
    next_id: AtomicU64,
}

impl RecordingSessionManager {
    pub fn new(backend: Arc<dyn RecorderBackend>, cfg: RecorderConfig) -> Self {
        Self {
            backend,
            cfg,
            recorder: Mutex::new(None),
            core: Arc::new(Mutex::new(EventCore::new())),
            extraction: tokio::sync::Mutex::new(()),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.cfg
    }

    pub fn state(&self) -> SessionState {
        self.core.lock().state
    }

    /// Media type chosen for the current recorder, if any.
    pub fn media_type(&self) -> Option<MediaType> {
        self.recorder.lock().as_ref().map(|a| a.media_type.clone())
    }

    /// Id of the current recorder, if any.
    pub fn current_recorder(&self) -> Option<RecorderId> {
        self.recorder.lock().as_ref().map(|a| a.id)
    }

    /// Watch the session buffer. A new value is published after every accepted recorder event.
    pub fn subscribe(&self) -> watch::Receiver<BufferSignal> {
        self.core.lock().subscribe()
    }

    /// Start recording a new shot from `stream`.
    ///
    /// Waits for any outstanding extraction first. A previous recorder that is still running is
    /// flushed, stopped and its unextracted chunks discarded.
    #[tracing::instrument(skip(self, stream))]
    pub async fn start(&self, stream: Arc<dyn CaptureStream>) -> StartOutcome {
        let _gate = self.extraction.lock().await;

        if !stream.has_live_track() {
            tracing::warn!("capture stream has no live video track; not recording");
            return StartOutcome::Skipped(LivestripError::TrackNotLive);
        }

        let Some(media_type) =
            pick_supported(&self.cfg.media_types, |m| self.backend.is_type_supported(m)).cloned()
        else {
            let err = LivestripError::unsupported_codec(&self.cfg.media_types);
            tracing::warn!("{err}; not recording");
            return StartOutcome::Skipped(err);
        };

        let previous = self.recorder.lock().take();
        if let Some(previous) = previous {
            self.retire(previous).await;
        }

        let id = RecorderId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.core.lock().begin(id);

        let events = RecorderEvents::new(id, &self.core);
        let mut handle = match self.backend.create(stream, &media_type, events) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(recorder = %id, "failed to create recorder: {e}");
                self.core.lock().force_stopped();
                return StartOutcome::Skipped(e);
            }
        };
        if let Err(e) = handle.start(self.cfg.timeslice) {
            tracing::warn!(recorder = %id, "failed to start recorder: {e}");
            self.core.lock().force_stopped();
            return StartOutcome::Skipped(e);
        }

        *self.recorder.lock() = Some(ActiveRecorder {
            id,
            media_type: media_type.clone(),
            handle,
        });
        tracing::info!(recorder = %id, %media_type, timeslice = ?self.cfg.timeslice, "recording started");
        StartOutcome::Started {
            recorder: id,
            media_type,
        }
    }

    /// Request the recorder to stop. No-op unless the session is recording.
    pub fn stop(&self) {
        let mut slot = self.recorder.lock();
        let Some(active) = slot.as_mut() else {
            tracing::debug!("stop: no recorder");
            return;
        };
        {
            let mut core = self.core.lock();
            if core.state != SessionState::Recording {
                tracing::debug!(state = ?core.state, "stop: nothing to do");
                return;
            }
            core.apply(SessionEvent::StopRequested);
        }
        if let Err(e) = active.handle.stop() {
            tracing::warn!(recorder = %active.id, "recorder stop failed: {e}");
            self.core.lock().force_stopped();
        }
    }

    /// Drain the current recorder into a validated clip.
    ///
    /// Resolves exactly once per call. Every failure (no recorder, flush or stop error, too few
    /// chunks, too few bytes) resolves to `None` after being logged.
    #[tracing::instrument(skip(self))]
    pub async fn extract_clip(&self) -> Option<Clip> {
        let _gate = self.extraction.lock().await;

        let Some((id, media_type)) = self
            .recorder
            .lock()
            .as_ref()
            .map(|a| (a.id, a.media_type.clone()))
        else {
            tracing::debug!("extract: no recorder was started");
            return None;
        };

        // Subscribe before touching the recorder so its stop event cannot be missed.
        let (mut rx, state) = {
            let core = self.core.lock();
            (core.subscribe(), core.state)
        };

        match state {
            SessionState::Recording => {
                if let Err(e) = self.flush_and_stop(id).await {
                    tracing::warn!(recorder = %id, "flush/stop failed: {e}");
                    self.fail_extraction(id);
                    return None;
                }
            }
            SessionState::Stopping => {
                tracing::debug!(recorder = %id, "stop already requested; waiting for it");
            }
            SessionState::Inactive | SessionState::Idle => {}
        }

        if state.is_active() {
            self.await_stop(id, &mut rx).await;
            let settled = self
                .cfg
                .debounce()
                .settle(&mut rx, |s| s.owner == Some(id) && s.chunks > 0)
                .await;
            if settled != Settled::Quiet {
                tracing::debug!(recorder = %id, ?settled, "chunk buffer did not go quiet");
            }
        }

        self.settle_clip(id, media_type)
    }

    /// Flush the recorder twice, then stop it. A paused recorder is stopped directly.
    async fn flush_and_stop(&self, id: RecorderId) -> LivestripResult<()> {
        let recording = self.with_recorder(id, |r| Ok(r.state() == RecorderState::Recording))?;
        if recording {
            self.with_recorder(id, |r| r.request_data())?;
            tokio::time::sleep(self.cfg.flush_delay).await;
            self.with_recorder(id, |r| {
                if r.state() == RecorderState::Recording {
                    r.request_data()?;
                }
                Ok(())
            })?;
            tokio::time::sleep(self.cfg.stop_delay).await;
        }

        self.core.lock().apply(SessionEvent::StopRequested);
        self.with_recorder(id, |r| {
            if r.state() != RecorderState::Inactive {
                r.stop()?;
            }
            Ok(())
        })
    }

    async fn await_stop(&self, id: RecorderId, rx: &mut watch::Receiver<BufferSignal>) {
        let wait = async {
            rx.wait_for(|s| s.owner == Some(id) && s.stopped)
                .await
                .map(|_| ())
        };
        match tokio::time::timeout(self.cfg.stop_timeout, wait).await {
            Ok(Ok(())) => tracing::debug!(recorder = %id, "stop event received"),
            Ok(Err(_)) => tracing::debug!(recorder = %id, "buffer signal closed"),
            Err(_) => {
                tracing::warn!(
                    recorder = %id,
                    timeout = ?self.cfg.stop_timeout,
                    "stop event did not arrive; settling with buffered chunks"
                );
                self.core.lock().force_stopped();
            }
        }
    }

    fn settle_clip(&self, id: RecorderId, media_type: MediaType) -> Option<Clip> {
        let chunks = {
            let mut core = self.core.lock();
            if core.buffer.owner() != Some(id) {
                tracing::warn!(recorder = %id, "buffer was handed to another recorder");
                return None;
            }
            let chunks = core.buffer.take();
            core.publish();
            chunks
        };

        let count = chunks.len();
        match Clip::from_chunks(chunks, media_type) {
            Ok(clip) => {
                tracing::info!(recorder = %id, chunks = count, bytes = clip.size(), "clip extracted");
                Some(clip)
            }
            Err(e) => {
                tracing::warn!(recorder = %id, "clip rejected: {e}");
                None
            }
        }
    }

    /// Best-effort stop after a failed flush; the buffer is cleared.
    fn fail_extraction(&self, id: RecorderId) {
        let stopped = self.with_recorder(id, |r| {
            if r.state() != RecorderState::Inactive {
                r.stop()?;
            }
            Ok(())
        });
        if let Err(e) = stopped {
            tracing::debug!(recorder = %id, "best-effort stop failed: {e}");
        }
        let mut core = self.core.lock();
        let dropped = core.buffer.take();
        if !dropped.is_empty() {
            tracing::debug!(recorder = %id, chunks = dropped.len(), "cleared buffer after failed extraction");
        }
        core.force_stopped();
    }

    /// Shut down a recorder that is being replaced.
    async fn retire(&self, mut previous: ActiveRecorder) {
        let state = previous.handle.state();
        if state == RecorderState::Inactive {
            tracing::debug!(recorder = %previous.id, "previous recorder already inactive");
            self.core.lock().apply(SessionEvent::Stopped);
            return;
        }

        tracing::warn!(recorder = %previous.id, "previous recorder still running; stopping it");
        if state == RecorderState::Recording
            && let Err(e) = previous.handle.request_data()
        {
            tracing::debug!(recorder = %previous.id, "final flush failed: {e}");
        }
        tokio::time::sleep(self.cfg.abandon_stop_delay).await;
        if previous.handle.state() != RecorderState::Inactive
            && let Err(e) = previous.handle.stop()
        {
            tracing::warn!(recorder = %previous.id, "stopping previous recorder failed: {e}");
        }
        self.core.lock().apply(SessionEvent::Stopped);
    }

    fn with_recorder<T>(
        &self,
        id: RecorderId,
        f: impl FnOnce(&mut dyn Recorder) -> LivestripResult<T>,
    ) -> LivestripResult<T> {
        let mut slot = self.recorder.lock();
        match slot.as_mut() {
            Some(active) if active.id == id => f(active.handle.as_mut()),
            _ => Err(LivestripError::Other(anyhow::anyhow!(
                "recorder {id} is no longer active"
            ))),
        }
    }
}
