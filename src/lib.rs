//! break-timer - Reminds you to take breaks by locking the screen.
//!
//! Polls the desktop screensaver once a minute, counts continuous unlocked
//! minutes and, once the configured active time is reached, warns and locks
//! the screen or offers a snooze.

pub mod autostart;
pub mod config;
pub mod desktop;
pub mod monitor;
pub mod timer;
