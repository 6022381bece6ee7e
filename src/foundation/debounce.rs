use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};

/// Quiet-window timer used to decide when a stream of updates has stopped changing.
///
/// `settle` resolves once no update has been observed for `quiet`, at least `min_wait` has
/// elapsed, and the caller's readiness predicate holds. It always resolves by `cap`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Debounce {
    pub quiet: Duration,
    pub min_wait: Duration,
    pub cap: Duration,
}

/// How a [`Debounce::settle`] call finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settled {
    /// The value was ready and stable for the quiet window.
    Quiet,
    /// The hard cap elapsed first.
    CapReached,
    /// The sending side went away.
    Closed,
}

impl Debounce {
    pub fn new(quiet: Duration, min_wait: Duration, cap: Duration) -> Self {
        Self {
            quiet,
            min_wait,
            cap,
        }
    }

    /// Wait on `rx` until it settles. See the type docs for the rule.
    pub async fn settle<T>(
        &self,
        rx: &mut watch::Receiver<T>,
        ready: impl Fn(&T) -> bool,
    ) -> Settled {
        let start = Instant::now();
        let cap_at = start + self.cap;
        let min_at = start + self.min_wait;
        let mut last_change = start;

        loop {
            let now = Instant::now();
            let quiet_at = (last_change + self.quiet).max(min_at);
            if now >= quiet_at && ready(&*rx.borrow()) {
                return Settled::Quiet;
            }
            if now >= cap_at {
                return Settled::CapReached;
            }

            // Past the quiet point but not ready: only a new value or the cap can help.
            let wake_at = if quiet_at > now {
                quiet_at.min(cap_at)
            } else {
                cap_at
            };

            tokio::select! {
                changed = rx.changed() => match changed {
                    Ok(()) => last_change = Instant::now(),
                    Err(_) => return Settled::Closed,
                },
                _ = sleep_until(wake_at) => {}
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/debounce.rs"]
mod tests;
