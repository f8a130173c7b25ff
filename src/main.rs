//! break-timer - Reminds you to take breaks by locking the screen.
//!
//! Counts continuous unlocked minutes and locks the screen once the configured
//! active time is reached, optionally offering a snooze.

use break_timer::autostart::{self, InstallPaths, InstallReport};
use break_timer::config::{self, ConfigFile, Overrides, Settings};
use break_timer::desktop::ShellDesktop;
use break_timer::monitor::IdleMonitor;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Exit status for usage, configuration and lock-query failures.
const EXIT_FAILURE: u8 = 2;

/// Break reminder for desktop sessions.
///
/// Locks the screen after a period of continuous activity.
///
/// Settings are read from <config dir>/break-timer/config.toml, a TOML file
/// with [default] and [snooze] tables. The INI file break-timer.conf written
/// by older installers is not read and has to be converted to TOML. The
/// desktop defaults to $DESKTOP_SESSION. Command-line flags override the file.
#[derive(Parser, Debug)]
#[command(name = "break-timer")]
#[command(author, version, about)]
struct Args {
    /// Name of the desktop environment (e.g. "gnome", "cinnamon", "xfce4").
    #[arg(short, long)]
    desktop: Option<String>,

    /// Minutes of activity before the screen gets locked.
    #[arg(short = 't', long = "active-time", value_name = "MINUTES",
          value_parser = clap::value_parser!(u32).range(1..))]
    active_time: Option<u32>,

    /// Seconds between the break notification and the lock.
    #[arg(short = 'p', long = "grace-period", value_name = "SECONDS")]
    grace_period: Option<u64>,

    /// Offer a snooze instead of locking right away (yes/no).
    #[arg(short = 's', long = "snooze-enable", value_name = "YES|NO",
          value_parser = config::parse_switch, action = clap::ArgAction::Set)]
    snooze_enable: Option<bool>,

    /// Snooze duration in minutes.
    #[arg(short = 'z', long = "snooze-time", value_name = "MINUTES",
          value_parser = clap::value_parser!(u32).range(1..))]
    snooze_time: Option<u32>,

    /// Path to config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable dry-run mode (don't actually lock the screen).
    #[arg(long)]
    dry_run: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the config file and start break-timer with the desktop session.
    Install {
        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },

    /// Stop starting break-timer with the desktop session.
    Uninstall,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            desktop: self.desktop.clone(),
            active_time_min: self.active_time,
            grace_period_sec: self.grace_period,
            snooze_enabled: self.snooze_enable,
            snooze_time_min: self.snooze_time,
            dry_run: self.dry_run,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(&args.log_level) {
        eprintln!("{e:#}");
        return ExitCode::from(EXIT_FAILURE);
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

/// Initialize logging with the specified level.
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(format!("break_timer={level}"))
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Invalid log level")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    Ok(())
}

async fn run(args: Args) -> Result<()> {
    debug!("break-timer v{} starting", env!("CARGO_PKG_VERSION"));

    let file = load_config(&args).context("Failed to load configuration")?;
    let settings = Settings::resolve(&file, &args.overrides(), config::env_desktop())
        .context("Invalid configuration")?;

    debug!("Resolved settings: {:?}", settings);

    match args.command {
        Some(Command::Install { force }) => {
            let paths = InstallPaths::user(args.config.as_deref())?;
            let exe = std::env::current_exe().context("Failed to locate executable")?;
            match autostart::install(&paths, &settings, &exe, force)? {
                InstallReport::ConfigWritten => {
                    info!("Configuration file created in {}", paths.config_file.display());
                }
                InstallReport::ConfigKept => info!(
                    "Keeping existing config file {} (use --force to overwrite)",
                    paths.config_file.display()
                ),
            }
            info!("Autostart entry created in {}", paths.desktop_entry.display());
            info!("Install completed!");
            Ok(())
        }
        Some(Command::Uninstall) => {
            let paths = InstallPaths::user(args.config.as_deref())?;
            if autostart::uninstall(&paths)? {
                info!("Removed {}", paths.desktop_entry.display());
            } else {
                info!("File {} not found", paths.desktop_entry.display());
            }
            info!("Uninstall completed!");
            Ok(())
        }
        None => run_monitor(settings).await,
    }
}

/// Load the config file named on the command line, or the default one.
///
/// `install` may name a config file that does not exist yet; it is created
/// from defaults and flags. `uninstall` does not need one.
fn load_config(args: &Args) -> Result<ConfigFile> {
    match (&args.command, args.config.as_deref()) {
        (Some(_), Some(path)) if !path.exists() => Ok(ConfigFile::default()),
        (_, path) => ConfigFile::load_or_default(path),
    }
}

/// Run the monitor until a shutdown signal or a failed lock-state query.
async fn run_monitor(settings: Settings) -> Result<()> {
    info!(
        "Configuration loaded (desktop={}, active_time={}m, grace_period={}s, snooze={}, dry_run={})",
        settings.desktop,
        settings.active_time_min,
        settings.grace_period_sec,
        if settings.snooze_enabled {
            format!("{}m", settings.snooze_time_min)
        } else {
            "off".to_string()
        },
        settings.dry_run
    );

    let desktop = ShellDesktop::from_settings(&settings);
    let mut monitor = IdleMonitor::new(desktop, settings);

    tokio::select! {
        result = monitor.run() => {
            result.context("Error running screensaver-command")
        }
        signal = shutdown_signal() => {
            signal?;
            info!("Shutting down");
            Ok(())
        }
    }
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for SIGINT")?;
            info!("Received SIGINT");
        }
        _ = sigterm.recv() => info!("Received SIGTERM"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_short_flags() {
        let args = Args::try_parse_from([
            "break-timer", "-d", "cinnamon", "-t", "45", "-p", "15", "-s", "yes", "-z", "10",
        ])
        .unwrap();
        let overrides = args.overrides();
        assert_eq!(overrides.desktop.as_deref(), Some("cinnamon"));
        assert_eq!(overrides.active_time_min, Some(45));
        assert_eq!(overrides.grace_period_sec, Some(15));
        assert_eq!(overrides.snooze_enabled, Some(true));
        assert_eq!(overrides.snooze_time_min, Some(10));
        assert!(!overrides.dry_run);
        assert!(args.command.is_none());
    }

    #[test]
    fn test_long_flags() {
        let args = Args::try_parse_from([
            "break-timer",
            "--desktop=xfce4",
            "--active-time=20",
            "--grace-period=5",
            "--snooze-enable=no",
            "--snooze-time=3",
            "--dry-run",
        ])
        .unwrap();
        let overrides = args.overrides();
        assert_eq!(overrides.desktop.as_deref(), Some("xfce4"));
        assert_eq!(overrides.active_time_min, Some(20));
        assert_eq!(overrides.grace_period_sec, Some(5));
        assert_eq!(overrides.snooze_enabled, Some(false));
        assert_eq!(overrides.snooze_time_min, Some(3));
        assert!(overrides.dry_run);
    }

    #[test]
    fn test_unset_flags_do_not_override() {
        let args = Args::try_parse_from(["break-timer"]).unwrap();
        let overrides = args.overrides();
        assert!(overrides.desktop.is_none());
        assert!(overrides.active_time_min.is_none());
        assert!(overrides.grace_period_sec.is_none());
        assert!(overrides.snooze_enabled.is_none());
        assert!(overrides.snooze_time_min.is_none());
    }

    #[test]
    fn test_usage_errors() {
        let zero = Args::try_parse_from(["break-timer", "-t", "0"]).unwrap_err();
        assert_eq!(zero.exit_code(), i32::from(EXIT_FAILURE));

        let bad_switch = Args::try_parse_from(["break-timer", "-s", "maybe"]).unwrap_err();
        assert_eq!(bad_switch.exit_code(), i32::from(EXIT_FAILURE));

        let not_a_number = Args::try_parse_from(["break-timer", "-p", "ten"]).unwrap_err();
        assert_eq!(not_a_number.exit_code(), i32::from(EXIT_FAILURE));
    }

    #[test]
    fn test_long_help_names_config_file() {
        let help = Args::command().render_long_help().to_string();
        assert!(help.contains("config.toml"));
        assert!(help.contains("break-timer.conf"));
        assert!(help.contains("DESKTOP_SESSION"));
    }

    #[tokio::test]
    #[serial_test::serial]
    async fn test_install_creates_fresh_config_path() {
        let dir = tempfile::tempdir().unwrap();
        let fresh = dir.path().join("fresh.toml");
        let saved = std::env::var_os("XDG_CONFIG_HOME");

        // SAFETY: serialized with the other environment tests.
        unsafe { std::env::set_var("XDG_CONFIG_HOME", dir.path()) };
        let args = Args::try_parse_from([
            "break-timer",
            "-c",
            fresh.to_str().unwrap(),
            "-d",
            "xfce4",
            "install",
        ])
        .unwrap();
        let result = run(args).await;
        match saved {
            Some(value) => unsafe { std::env::set_var("XDG_CONFIG_HOME", value) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }

        result.unwrap();
        let written = ConfigFile::load(&fresh).unwrap();
        assert_eq!(written.general.desktop.as_deref(), Some("xfce4"));
        let entry = dir.path().join("autostart").join("break-timer.desktop");
        assert!(std::fs::read_to_string(entry).unwrap().contains("fresh.toml"));
    }

    #[test]
    fn test_missing_config_path_fails_only_for_monitor() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");

        let args =
            Args::try_parse_from(["break-timer", "-c", missing.to_str().unwrap()]).unwrap();
        assert!(load_config(&args).is_err());

        let args = Args::try_parse_from([
            "break-timer",
            "-c",
            missing.to_str().unwrap(),
            "uninstall",
        ])
        .unwrap();
        assert_eq!(load_config(&args).unwrap(), ConfigFile::default());

        let args =
            Args::try_parse_from(["break-timer", "-c", missing.to_str().unwrap(), "install"])
                .unwrap();
        assert_eq!(load_config(&args).unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_subcommands() {
        let args = Args::try_parse_from(["break-timer", "-t", "45", "install", "--force"]).unwrap();
        assert!(matches!(args.command, Some(Command::Install { force: true })));
        assert_eq!(args.active_time, Some(45));

        let args = Args::try_parse_from(["break-timer", "uninstall"]).unwrap();
        assert!(matches!(args.command, Some(Command::Uninstall)));
    }
}
