//! Active-time counter state machine.
//!
//! Counts consecutive unlocked polls:
//! - A locked poll resets the counter to zero
//! - An unlocked poll adds one minute
//! - Reaching the threshold reports `ThresholdReached`; the caller decides
//!   whether to reset

use crate::desktop::LockState;
use tracing::debug;

/// Outcome of recording one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The screen was locked; the counter is back at zero.
    Reset,
    /// Still below the threshold.
    Accumulating { elapsed: u32, remaining: u32 },
    /// The counter is at or above the threshold.
    ThresholdReached { elapsed: u32 },
}

/// Active-time counter.
#[derive(Debug, Clone)]
pub struct ActiveTimer {
    /// Minutes of continuous active time since the last reset.
    elapsed_min: u32,

    /// Minutes of active time before a break is due.
    threshold_min: u32,
}

impl ActiveTimer {
    /// Create a timer with the counter at zero.
    pub fn new(threshold_min: u32) -> Self {
        Self {
            elapsed_min: 0,
            threshold_min,
        }
    }

    /// Record one poll result.
    ///
    /// An unlocked poll that reaches the threshold yields `ThresholdReached`
    /// rather than `Accumulating`. Locked polls never reach the threshold.
    pub fn record(&mut self, state: LockState) -> TimerEvent {
        match state {
            LockState::Locked => {
                if self.elapsed_min > 0 {
                    debug!("Screen locked, resetting after {} minutes", self.elapsed_min);
                }
                self.elapsed_min = 0;
                TimerEvent::Reset
            }
            LockState::Unlocked => {
                self.elapsed_min = self.elapsed_min.saturating_add(1);
                if self.elapsed_min >= self.threshold_min {
                    TimerEvent::ThresholdReached {
                        elapsed: self.elapsed_min,
                    }
                } else {
                    TimerEvent::Accumulating {
                        elapsed: self.elapsed_min,
                        remaining: self.remaining(),
                    }
                }
            }
        }
    }

    /// Reset the counter after a completed threshold action.
    pub fn reset(&mut self) {
        self.elapsed_min = 0;
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed_min
    }

    pub fn threshold(&self) -> u32 {
        self.threshold_min
    }

    /// Minutes left until the threshold, zero once it has been reached.
    pub fn remaining(&self) -> u32 {
        self.threshold_min.saturating_sub(self.elapsed_min)
    }
}
