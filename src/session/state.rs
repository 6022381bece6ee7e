/// Lifecycle of the session's recorder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No recorder was ever started.
    #[default]
    Idle,
    Recording,
    /// A stop was requested and the recorder's stop event has not arrived yet.
    Stopping,
    Inactive,
}

/// Inputs to [`SessionState::on`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Started,
    StopRequested,
    Stopped,
    Faulted,
}

impl SessionState {
    /// Transition table. Pairs with no row leave the state unchanged.
    pub fn on(self, event: SessionEvent) -> SessionState {
        use SessionEvent as E;
        use SessionState as S;
        match (self, event) {
            (_, E::Faulted) => S::Inactive,
            (S::Idle | S::Inactive | S::Recording, E::Started) => S::Recording,
            (S::Recording, E::StopRequested) => S::Stopping,
            (S::Recording | S::Stopping, E::Stopped) => S::Inactive,
            (s, e) => {
                tracing::debug!(state = ?s, event = ?e, "session event ignored");
                s
            }
        }
    }

    /// Return `true` while a recorder is capturing or finishing its capture.
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Recording | SessionState::Stopping)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/state.rs"]
mod tests;
