//! Desktop environment integration.
//!
//! The monitor talks to the desktop only through the [`Desktop`] trait: one
//! awaited lock-state query, one awaited snooze prompt and two fire-and-forget
//! actions (notification and lock).

mod shell;

pub use shell::ShellDesktop;
use thiserror::Error;

/// Stdout marker of `<desktop>-screensaver-command -q` for an unlocked screen.
pub const SCREENSAVER_INACTIVE_MSG: &str = "The screensaver is inactive";

/// Result of a lock-state query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Locked,
    Unlocked,
}

impl LockState {
    /// Interpret the output of the screensaver query command.
    pub fn from_query_output(stdout: &str) -> Self {
        if stdout.contains(SCREENSAVER_INACTIVE_MSG) {
            Self::Unlocked
        } else {
            Self::Locked
        }
    }
}

/// The user's answer to the snooze prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnoozeChoice {
    /// Prompt accepted: lock now.
    TakeBreak,
    /// Prompt dismissed with the snooze button.
    Snooze,
}

/// Trait for desktop environments the monitor can drive.
#[allow(async_fn_in_trait)]
pub trait Desktop {
    /// Query whether the screen is currently locked.
    ///
    /// This is the only call whose failure is reported.
    async fn query_lock_state(&mut self) -> Result<LockState, QueryError>;

    /// Lock the screen. Fire-and-forget: completion and failure are not observed.
    fn lock(&mut self);

    /// Show a desktop notification. Fire-and-forget.
    fn notify(&mut self, title: &str);

    /// Ask whether to take a break now or snooze, blocking until answered.
    async fn ask_snooze(&mut self, snooze_time_min: u32) -> SnoozeChoice;
}

/// Errors from the lock-state query. All of them are fatal to the monitor.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Failed to run {command}: {source}. Make sure it is installed for your desktop environment")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with code {code:?}: {stderr}")]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}
