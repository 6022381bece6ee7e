use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::capture::RecorderId;
use crate::session::chunks::ChunkBuffer;
use crate::session::state::{SessionEvent, SessionState};

/// Snapshot of the buffer published after every accepted recorder event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BufferSignal {
    /// Recorder instance owning the buffer.
    pub owner: Option<RecorderId>,
    /// Chunks currently buffered.
    pub chunks: usize,
    /// Bytes currently buffered.
    pub bytes: usize,
    /// Whether the owner has reported its stop (or a fatal error).
    pub stopped: bool,
}

/// State mutated by recorder callbacks. Shared between the manager and every
/// [`RecorderEvents`] handle.
#[derive(Debug)]
pub(crate) struct EventCore {
    pub(crate) state: SessionState,
    pub(crate) buffer: ChunkBuffer,
    stopped: bool,
    signal: watch::Sender<BufferSignal>,
}

impl EventCore {
    pub(crate) fn new() -> Self {
        let (signal, _) = watch::channel(BufferSignal::default());
        Self {
            state: SessionState::Idle,
            buffer: ChunkBuffer::new(),
            stopped: false,
            signal,
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<BufferSignal> {
        self.signal.subscribe()
    }

    /// Hand the buffer to recorder `id` and mark the session recording.
    pub(crate) fn begin(&mut self, id: RecorderId) {
        let (chunks, bytes) = self.buffer.reset_for(id);
        if chunks > 0 {
            tracing::warn!(recorder = %id, chunks, bytes, "discarding unextracted chunks");
        }
        self.stopped = false;
        self.apply(SessionEvent::Started);
        self.publish();
    }

    pub(crate) fn apply(&mut self, event: SessionEvent) {
        let next = self.state.on(event);
        if next != self.state {
            tracing::debug!(from = ?self.state, to = ?next, ?event, "session transition");
        }
        self.state = next;
    }

    /// Mark the current owner stopped without a recorder event, e.g. after a failed stop.
    pub(crate) fn force_stopped(&mut self) {
        self.stopped = true;
        self.apply(SessionEvent::Faulted);
        self.publish();
    }

    pub(crate) fn publish(&self) {
        self.signal.send_replace(BufferSignal {
            owner: self.buffer.owner(),
            chunks: self.buffer.len(),
            bytes: self.buffer.byte_len(),
            stopped: self.stopped,
        });
    }

    fn owns(&self, id: RecorderId) -> bool {
        self.buffer.owner() == Some(id)
    }
}

/// Callback handle given to a recorder at creation.
///
/// Every notification is tagged with the recorder's id; notifications from an instance that no
/// longer owns the session buffer are dropped. Safe to call from any thread, including from
/// inside [`crate::capture::Recorder`] methods.
#[derive(Clone, Debug)]
pub struct RecorderEvents {
    id: RecorderId,
    core: Weak<Mutex<EventCore>>,
}

impl RecorderEvents {
    pub(crate) fn new(id: RecorderId, core: &Arc<Mutex<EventCore>>) -> Self {
        Self {
            id,
            core: Arc::downgrade(core),
        }
    }

    pub fn id(&self) -> RecorderId {
        self.id
    }

    /// A chunk of recorded data is available. Empty chunks are ignored.
    pub fn data_available(&self, chunk: Vec<u8>) {
        if chunk.is_empty() {
            return;
        }
        let Some(core) = self.core.upgrade() else {
            return;
        };
        let mut core = core.lock();
        let len = chunk.len();
        if !core.buffer.push(self.id, chunk) {
            tracing::debug!(recorder = %self.id, bytes = len, "ignoring chunk from stale recorder");
            return;
        }
        tracing::debug!(
            recorder = %self.id,
            bytes = len,
            chunks = core.buffer.len(),
            total = core.buffer.byte_len(),
            "chunk received"
        );
        core.publish();
    }

    /// The recorder has stopped and will emit nothing further.
    pub fn stopped(&self) {
        let Some(core) = self.core.upgrade() else {
            return;
        };
        let mut core = core.lock();
        if !core.owns(self.id) {
            tracing::debug!(recorder = %self.id, "ignoring stop from stale recorder");
            return;
        }
        core.stopped = true;
        core.apply(SessionEvent::Stopped);
        tracing::debug!(recorder = %self.id, chunks = core.buffer.len(), "recorder stopped");
        core.publish();
    }

    /// The recorder hit an error and is unusable.
    pub fn error(&self, msg: impl std::fmt::Display) {
        let Some(core) = self.core.upgrade() else {
            return;
        };
        let mut core = core.lock();
        if !core.owns(self.id) {
            tracing::debug!(recorder = %self.id, "ignoring error from stale recorder: {msg}");
            return;
        }
        tracing::warn!(recorder = %self.id, "recorder error: {msg}");
        core.force_stopped();
    }
}
