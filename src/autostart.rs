//! Installation into the user's session.
//!
//! `install` writes the config file and an XDG autostart entry so the timer
//! starts with the desktop session; `uninstall` removes the entry again.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::{self, ConfigFile, Settings};

const DESKTOP_ENTRY_NAME: &str = "break-timer.desktop";

/// Files touched by install and uninstall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPaths {
    /// Config file written from the resolved settings.
    pub config_file: PathBuf,

    /// XDG autostart entry.
    pub desktop_entry: PathBuf,
}

impl InstallPaths {
    /// Paths under the user's config directory.
    ///
    /// `config_file` replaces the default config path when given.
    pub fn user(config_file: Option<&Path>) -> Result<Self> {
        let config_dir = dirs::config_dir().context("Could not determine user config directory")?;

        let config_file = match config_file {
            Some(p) => p.to_path_buf(),
            None => config::default_config_path()
                .context("Could not determine default config file path")?,
        };

        Ok(Self {
            config_file,
            desktop_entry: config_dir.join("autostart").join(DESKTOP_ENTRY_NAME),
        })
    }
}

/// What `install` did with the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallReport {
    /// The config file was written from the resolved settings.
    ConfigWritten,
    /// An existing config file was left untouched.
    ConfigKept,
}

/// Write the config file and autostart entry.
///
/// An existing config file is left alone unless `force` is set. The autostart
/// entry is always rewritten so it points at `exe`.
pub fn install(
    paths: &InstallPaths,
    settings: &Settings,
    exe: &Path,
    force: bool,
) -> Result<InstallReport> {
    let report = if paths.config_file.exists() && !force {
        InstallReport::ConfigKept
    } else {
        ConfigFile::from(settings).save(&paths.config_file)?;
        InstallReport::ConfigWritten
    };

    if let Some(parent) = paths.desktop_entry.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(&paths.desktop_entry, desktop_entry(exe, &paths.config_file, settings))
        .with_context(|| {
            format!(
                "Failed to write autostart entry: {}",
                paths.desktop_entry.display()
            )
        })?;

    Ok(report)
}

/// Remove the autostart entry. Returns false if there was none.
///
/// The config file is kept.
pub fn uninstall(paths: &InstallPaths) -> Result<bool> {
    match std::fs::remove_file(&paths.desktop_entry) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| {
            format!(
                "Failed to remove autostart entry: {}",
                paths.desktop_entry.display()
            )
        }),
    }
}

/// Render the XDG autostart desktop entry.
fn desktop_entry(exe: &Path, config_file: &Path, settings: &Settings) -> String {
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name=Break Timer\n\
         Comment=Lock the screen after {} minutes of continuous activity\n\
         Exec=\"{}\" --config \"{}\"\n\
         Icon={}\n\
         Terminal=false\n\
         X-GNOME-Autostart-enabled=true\n",
        settings.active_time_min,
        exe.display(),
        config_file.display(),
        settings.icon.display(),
    )
}
