//! Desktop backend built on command-line tools.
//!
//! Uses `<desktop>-screensaver-command` for lock state and locking,
//! `notify-send` for notifications and `zenity` for the snooze prompt.

use super::{Desktop, LockState, QueryError, SnoozeChoice};
use crate::config::Settings;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, trace};

const NOTIFIER: &str = "notify-send";
const DIALOG: &str = "zenity";

const PROMPT_TITLE: &str = "Time to take break!";
const PROMPT_TEXT: &str = "Do you want to take a break now?";

/// Desktop backend that shells out to independently installed tools.
#[derive(Debug)]
pub struct ShellDesktop {
    /// `<desktop>-screensaver-command`.
    screensaver: String,

    /// Icon passed to the notifier.
    icon: PathBuf,

    /// Log the lock command instead of running it.
    dry_run: bool,
}

impl ShellDesktop {
    /// Create a backend for the configured desktop.
    pub fn from_settings(settings: &Settings) -> Self {
        let screensaver = settings.screensaver_command();
        info!("Using screensaver command: {}", screensaver);

        Self {
            screensaver,
            icon: settings.icon.clone(),
            dry_run: settings.dry_run,
        }
    }

    fn notify_args(&self, title: &str) -> Vec<String> {
        vec![
            title.to_string(),
            "--icon".to_string(),
            self.icon.display().to_string(),
        ]
    }

    /// Spawn a command without waiting for it.
    ///
    /// The child is detached; its exit status is never observed.
    fn spawn_detached(program: &str, args: &[String]) {
        debug!("Spawning: {} {}", program, args.join(" "));

        let spawned = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        if let Err(e) = spawned {
            debug!("Ignoring failure to spawn {}: {}", program, e);
        }
    }
}

impl Desktop for ShellDesktop {
    async fn query_lock_state(&mut self) -> Result<LockState, QueryError> {
        trace!("Querying lock state: {} -q", self.screensaver);

        let output = Command::new(&self.screensaver)
            .arg("-q")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| QueryError::Spawn {
                command: self.screensaver.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(QueryError::Failed {
                command: self.screensaver.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let state = LockState::from_query_output(stdout.trim());
        trace!("Lock state: {:?}", state);
        Ok(state)
    }

    fn lock(&mut self) {
        if self.dry_run {
            info!("[DRY RUN] Would execute: {} -l", self.screensaver);
            return;
        }

        Self::spawn_detached(&self.screensaver, &["-l".to_string()]);
    }

    fn notify(&mut self, title: &str) {
        let args = self.notify_args(title);
        Self::spawn_detached(NOTIFIER, &args);
    }

    async fn ask_snooze(&mut self, snooze_time_min: u32) -> SnoozeChoice {
        let args = snooze_prompt_args(snooze_time_min);
        debug!("Prompting: {} {}", DIALOG, args.join(" "));

        let status = Command::new(DIALOG)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(s) if s.success() => SnoozeChoice::TakeBreak,
            Ok(s) => {
                debug!("Snooze prompt dismissed (exit code {:?})", s.code());
                SnoozeChoice::Snooze
            }
            Err(e) => {
                debug!("Ignoring failure to run {}: {}", DIALOG, e);
                SnoozeChoice::TakeBreak
            }
        }
    }
}

/// Arguments for the zenity question dialog; the cancel button is the snooze.
fn snooze_prompt_args(snooze_time_min: u32) -> Vec<String> {
    vec![
        "--question".to_string(),
        "--title".to_string(),
        PROMPT_TITLE.to_string(),
        "--text".to_string(),
        PROMPT_TEXT.to_string(),
        "--cancel-label".to_string(),
        format!("Snooze for {snooze_time_min} minutes"),
        "--no-wrap".to_string(),
    ]
}
