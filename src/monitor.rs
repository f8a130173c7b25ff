//! Idle monitor loop.
//!
//! Polls the desktop lock state once a minute and runs the break action when
//! the active-time threshold is reached.

use std::time::Duration;

use tracing::{debug, info};

use crate::config::Settings;
use crate::desktop::{Desktop, QueryError, SnoozeChoice};
use crate::timer::{ActiveTimer, TimerEvent};

/// Sleep between lock-state polls. One unlocked poll counts as one minute.
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// What a single cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Screen was locked, counter reset.
    Reset,
    /// Screen unlocked, threshold not reached yet.
    Accumulating,
    /// Threshold reached and the lock command was issued.
    Locked,
    /// Threshold reached and the user snoozed; counter left as is.
    Snoozed,
}

/// Drives an [`ActiveTimer`] from lock-state polls of a [`Desktop`].
pub struct IdleMonitor<D> {
    desktop: D,
    timer: ActiveTimer,
    settings: Settings,
}

impl<D: Desktop> IdleMonitor<D> {
    pub fn new(desktop: D, settings: Settings) -> Self {
        Self {
            desktop,
            timer: ActiveTimer::new(settings.active_time_min),
            settings,
        }
    }

    /// Current active minutes.
    pub fn elapsed(&self) -> u32 {
        self.timer.elapsed()
    }

    /// Run until the lock-state query fails.
    ///
    /// Each cycle sleeps for [`POLL_INTERVAL`] first, then polls.
    pub async fn run(&mut self) -> Result<(), QueryError> {
        info!(
            "Timer started. Next break in {} minutes.",
            self.timer.threshold()
        );

        loop {
            tokio::time::sleep(POLL_INTERVAL).await;
            let outcome = self.cycle().await?;
            debug!("Cycle finished: {:?} (elapsed={})", outcome, self.elapsed());
        }
    }

    /// Poll once and act on the result.
    pub async fn cycle(&mut self) -> Result<CycleOutcome, QueryError> {
        let state = self.desktop.query_lock_state().await?;

        match self.timer.record(state) {
            TimerEvent::Reset => Ok(CycleOutcome::Reset),
            TimerEvent::Accumulating { elapsed, remaining } => {
                info!(
                    "Timer is running for {} minutes. Next break in {} minutes.",
                    elapsed, remaining
                );
                Ok(CycleOutcome::Accumulating)
            }
            TimerEvent::ThresholdReached { elapsed } => {
                info!(
                    "Timer is running for {} minutes. Next break in 0 minutes.",
                    elapsed
                );
                Ok(self.take_break().await)
            }
        }
    }

    async fn take_break(&mut self) -> CycleOutcome {
        if !self.settings.snooze_enabled {
            self.warn_and_lock().await;
            return CycleOutcome::Locked;
        }

        match self.desktop.ask_snooze(self.settings.snooze_time_min).await {
            SnoozeChoice::Snooze => {
                let minutes = self.settings.snooze_time_min;
                info!("Snoozed for {} minutes", minutes);
                self.desktop
                    .notify(&format!("Timer is snoozed for {minutes} minutes."));
                tokio::time::sleep(Duration::from_secs(u64::from(minutes) * 60)).await;
                // Counter stays at or above the threshold, so the next
                // unlocked poll prompts again.
                CycleOutcome::Snoozed
            }
            SnoozeChoice::TakeBreak => {
                info!("Break accepted, locking screen");
                self.timer.reset();
                self.desktop.lock();
                CycleOutcome::Locked
            }
        }
    }

    async fn warn_and_lock(&mut self) {
        let grace = self.settings.grace_period_sec;
        info!("Break time, locking screen in {} seconds", grace);
        self.desktop.notify(&format!(
            "Time to take a break! Your PC will be locked in {grace} seconds."
        ));
        tokio::time::sleep(Duration::from_secs(grace)).await;
        self.timer.reset();
        self.desktop.lock();
    }
}
