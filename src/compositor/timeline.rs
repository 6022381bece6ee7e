use crate::config::FrameSchedule;

/// Distance kept below a clip's playable length so seeks land on a real frame.
const END_GUARD_SECS: f64 = 0.01;
/// Crossfade layers below this weight are not drawn.
pub const MIN_LAYER_WEIGHT: f32 = 0.01;

/// Timing values derived once per render tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickContext {
    /// Seconds since rendering began.
    pub elapsed: f64,
    /// Seconds into the current loop cycle.
    pub time_in_cycle: f64,
    /// Zero-based loop cycle index.
    pub loop_index: u32,
    /// Progress to report for this tick, 30..=95.
    pub progress: u8,
    /// The composite duration has been reached; nothing more is rendered.
    pub finished: bool,
}

/// Opacities of the two layers drawn for a slot inside a crossfade window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CrossfadeWeights {
    /// Weight of the frame at the slot's tracked position.
    pub current: f32,
    /// Weight of the clip's first frame.
    pub loop_start: f32,
}

impl FrameSchedule {
    pub fn tick(&self, elapsed: f64) -> TickContext {
        let elapsed = elapsed.max(0.0);
        let cycle = self.cycle_secs();
        let total = self.total_secs();
        let frac = if total > 0.0 {
            (elapsed / total).min(1.0)
        } else {
            1.0
        };
        TickContext {
            elapsed,
            time_in_cycle: elapsed % cycle,
            loop_index: (elapsed / cycle).floor() as u32,
            progress: (30.0 + 65.0 * frac).round() as u8,
            finished: elapsed >= total,
        }
    }

    /// Crossfade weights for `tick`, or `None` outside the blend windows.
    ///
    /// The window before a cycle boundary is skipped on the last loop and the window after it
    /// on the first, so the composite neither fades out at the end nor in at the start.
    pub fn crossfade(&self, tick: &TickContext) -> Option<CrossfadeWeights> {
        let fade = self.crossfade_secs;
        if fade <= 0.0 {
            return None;
        }
        let cycle = self.cycle_secs();
        let t = tick.time_in_cycle;

        let current = if t >= cycle - fade && tick.loop_index + 1 < self.loop_count {
            (cycle - t) / fade
        } else if t < fade && tick.loop_index > 0 {
            t / fade
        } else {
            return None;
        };
        let current = current.clamp(0.0, 1.0) as f32;
        Some(CrossfadeWeights {
            current,
            loop_start: 1.0 - current,
        })
    }

    /// Seconds of a clip actually played per cycle: its duration, capped at
    /// `seconds_per_photo`. Clips without a usable duration play for the full window.
    pub fn playable_secs(&self, duration_secs: Option<f64>) -> f64 {
        match duration_secs {
            Some(d) if d.is_finite() && d > 0.0 => d.min(self.seconds_per_photo),
            _ => self.seconds_per_photo,
        }
    }
}

/// Per-slot playback position, carried from tick to tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SlotPlayback {
    pub position: f64,
}

impl SlotPlayback {
    /// Position for `tick`. During the play window the position tracks the cycle time; during
    /// the hold window the clip rests on its last playable frame.
    pub fn advance(self, tick: &TickContext, playable_secs: f64, schedule: &FrameSchedule) -> Self {
        let last = (playable_secs - END_GUARD_SECS).max(0.0);
        if tick.time_in_cycle < schedule.seconds_per_photo {
            Self {
                position: tick.time_in_cycle.min(last).max(0.0),
            }
        } else {
            Self { position: last }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/timeline.rs"]
mod tests;
