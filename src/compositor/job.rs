use crate::assets::clip::Clip;
use crate::effects::filters::FilterKind;

/// One composition request: the shot clips by slot plus presentation choices.
pub struct CompositionJob {
    /// Clips indexed by slot. `None` marks a shot with no clip.
    pub clips: Vec<Option<Clip>>,
    /// Number of slots in the strip layout.
    pub slot_count: usize,
    pub filter: FilterKind,
    /// Optional caption passed to the decorator.
    pub caption: Option<String>,
    /// Receives progress and state changes.
    pub progress: Box<dyn ProgressSink>,
}

impl CompositionJob {
    /// Job for `clips` with one slot per clip, no filter, no caption and no progress sink.
    pub fn new(clips: Vec<Option<Clip>>) -> Self {
        let slot_count = clips.len();
        Self {
            clips,
            slot_count,
            filter: FilterKind::None,
            caption: None,
            progress: Box::new(NoProgress),
        }
    }

    pub fn with_slot_count(mut self, slot_count: usize) -> Self {
        self.slot_count = slot_count;
        self
    }

    pub fn with_filter(mut self, filter: FilterKind) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_progress(mut self, progress: impl ProgressSink + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }
}

impl std::fmt::Debug for CompositionJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositionJob")
            .field(
                "clips",
                &self
                    .clips
                    .iter()
                    .map(|c| c.as_ref().map(Clip::size))
                    .collect::<Vec<_>>(),
            )
            .field("slot_count", &self.slot_count)
            .field("filter", &self.filter)
            .field("caption", &self.caption)
            .finish_non_exhaustive()
    }
}

/// Lifecycle of one composition job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Loading,
    Rendering,
    Finalizing,
    Resolved,
    Rejected,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Resolved | JobState::Rejected)
    }

    /// Return `true` if `self -> next` is a legal transition.
    pub fn can_move_to(self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Idle, Loading)
                | (Loading, Rendering)
                | (Rendering, Finalizing)
                | (Finalizing, Resolved)
                | (Loading | Rendering | Finalizing, Rejected)
        )
    }
}

/// Receives job progress (0..=100) and state changes.
pub trait ProgressSink: Send {
    fn progress(&mut self, percent: u8);

    fn state_changed(&mut self, state: JobState) {
        let _ = state;
    }
}

impl<F: FnMut(u8) + Send> ProgressSink for F {
    fn progress(&mut self, percent: u8) {
        self(percent)
    }
}

/// Discards progress.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn progress(&mut self, _: u8) {}
}

/// Wraps a sink so reported progress never decreases and state changes follow
/// [`JobState::can_move_to`].
pub(crate) struct ProgressReporter {
    sink: Box<dyn ProgressSink>,
    last: Option<u8>,
    state: JobState,
}

impl ProgressReporter {
    pub(crate) fn new(sink: Box<dyn ProgressSink>) -> Self {
        Self {
            sink,
            last: None,
            state: JobState::Idle,
        }
    }

    pub(crate) fn report(&mut self, percent: u8) {
        let percent = percent.min(100);
        if self.last.is_some_and(|last| percent <= last) {
            return;
        }
        self.last = Some(percent);
        self.sink.progress(percent);
    }

    pub(crate) fn enter(&mut self, next: JobState) {
        if !self.state.can_move_to(next) {
            tracing::debug!(from = ?self.state, to = ?next, "ignoring illegal job transition");
            return;
        }
        tracing::debug!(from = ?self.state, to = ?next, "job transition");
        self.state = next;
        self.sink.state_changed(next);
    }

    pub(crate) fn state(&self) -> JobState {
        self.state
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/job.rs"]
mod tests;
