//! Recording session management: one recorder per shot, drained into one clip per shot.

/// Recorder-tagged chunk buffer.
pub mod chunks;
mod events;
/// The session manager.
pub mod manager;
/// Session lifecycle states and transitions.
pub mod state;

pub use chunks::ChunkBuffer;
pub use events::{BufferSignal, RecorderEvents};
pub use manager::{RecordingSessionManager, StartOutcome};
pub use state::{SessionEvent, SessionState};
