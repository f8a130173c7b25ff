//! Configuration loading, defaults and precedence for break-timer.
//!
//! Values are resolved per option: command-line flag, then config file, then
//! built-in default. `DESKTOP_SESSION` only replaces the built-in desktop.
//!
//! The file lives at `<config_dir>/break-timer/config.toml` and is TOML. The
//! INI file `break-timer.conf` written by older installers is not read; a
//! warning is logged when it is found without a `config.toml` next to it.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable providing the default desktop identifier.
pub const DESKTOP_ENV_VAR: &str = "DESKTOP_SESSION";

/// File name of the INI config written by older installers.
pub const LEGACY_CONFIG_NAME: &str = "break-timer.conf";

/// Application directory name under the user config dir.
pub const APP_DIR: &str = "break-timer";

const DEFAULT_DESKTOP: &str = "gnome";
const DEFAULT_ACTIVE_TIME_MIN: u32 = 30;
const DEFAULT_GRACE_PERIOD_SEC: u64 = 10;
const DEFAULT_SNOOZE_TIME_MIN: u32 = 5;

/// On-disk configuration file.
///
/// Every key is optional so that the file only overrides what it names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// The `[default]` table.
    #[serde(rename = "default")]
    pub general: GeneralSection,

    /// The `[snooze]` table.
    pub snooze: SnoozeSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desktop: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_active_time_min: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace_period_sec: Option<u64>,

    /// Icon shown with notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnoozeSection {
    /// Accepts a TOML bool or one of yes/no/true/false/y/n.
    #[serde(
        deserialize_with = "deserialize_switch",
        skip_serializing_if = "Option::is_none"
    )]
    pub snooze_enabled: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub snooze_time_min: Option<u32>,
}

impl ConfigFile {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load the given file, or the default path if it exists, or nothing.
    ///
    /// An explicitly given path must exist; a missing default file is not an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(p) = path {
            return Self::load(p);
        }

        if let Some(default_path) = default_config_path() {
            if default_path.exists() {
                return Self::load(&default_path);
            }
            if let Some(legacy) = legacy_config_beside(&default_path) {
                warn!(
                    "Ignoring {} (INI format); convert it to TOML at {}",
                    legacy.display(),
                    default_path.display()
                );
            }
        }

        Ok(Self::default())
    }

    /// Write this configuration as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

impl From<&Settings> for ConfigFile {
    fn from(settings: &Settings) -> Self {
        Self {
            general: GeneralSection {
                desktop: Some(settings.desktop.clone()),
                max_active_time_min: Some(settings.active_time_min),
                grace_period_sec: Some(settings.grace_period_sec),
                icon: Some(settings.icon.clone()),
            },
            snooze: SnoozeSection {
                snooze_enabled: Some(settings.snooze_enabled),
                snooze_time_min: Some(settings.snooze_time_min),
            },
        }
    }
}

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub desktop: Option<String>,
    pub active_time_min: Option<u32>,
    pub grace_period_sec: Option<u64>,
    pub snooze_enabled: Option<bool>,
    pub snooze_time_min: Option<u32>,
    pub dry_run: bool,
}

/// Fully resolved settings, immutable for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Desktop identifier, the prefix of `<desktop>-screensaver-command`.
    pub desktop: String,

    /// Continuous active minutes before a break is due.
    pub active_time_min: u32,

    /// Seconds between the warning notification and the lock.
    pub grace_period_sec: u64,

    pub snooze_enabled: bool,

    pub snooze_time_min: u32,

    pub icon: PathBuf,

    /// Log the lock command instead of executing it.
    pub dry_run: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            desktop: DEFAULT_DESKTOP.to_string(),
            active_time_min: DEFAULT_ACTIVE_TIME_MIN,
            grace_period_sec: DEFAULT_GRACE_PERIOD_SEC,
            snooze_enabled: false,
            snooze_time_min: DEFAULT_SNOOZE_TIME_MIN,
            icon: default_icon_path(),
            dry_run: false,
        }
    }
}

impl Settings {
    /// Merge the three layers and validate the result.
    ///
    /// `env_desktop` is the value of [`DESKTOP_ENV_VAR`], if any.
    pub fn resolve(
        file: &ConfigFile,
        overrides: &Overrides,
        env_desktop: Option<String>,
    ) -> Result<Self> {
        let defaults = Self::default();
        let default_desktop = env_desktop
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(defaults.desktop);

        let settings = Self {
            desktop: overrides
                .desktop
                .clone()
                .or_else(|| file.general.desktop.clone())
                .unwrap_or(default_desktop),
            active_time_min: overrides
                .active_time_min
                .or(file.general.max_active_time_min)
                .unwrap_or(defaults.active_time_min),
            grace_period_sec: overrides
                .grace_period_sec
                .or(file.general.grace_period_sec)
                .unwrap_or(defaults.grace_period_sec),
            snooze_enabled: overrides
                .snooze_enabled
                .or(file.snooze.snooze_enabled)
                .unwrap_or(defaults.snooze_enabled),
            snooze_time_min: overrides
                .snooze_time_min
                .or(file.snooze.snooze_time_min)
                .unwrap_or(defaults.snooze_time_min),
            icon: file.general.icon.clone().unwrap_or(defaults.icon),
            dry_run: overrides.dry_run,
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the monitor cannot work with.
    pub fn validate(&self) -> Result<()> {
        let desktop = self.desktop.trim();
        if desktop.is_empty() {
            anyhow::bail!("Desktop name must not be empty");
        }
        if desktop.contains(['/', '\\']) {
            anyhow::bail!("Desktop name must not contain path separators: {desktop}");
        }
        if self.active_time_min == 0 {
            anyhow::bail!("Active time must be at least 1 minute");
        }
        if self.snooze_time_min == 0 {
            anyhow::bail!("Snooze time must be at least 1 minute");
        }
        Ok(())
    }

    /// Name of the screensaver command for the configured desktop.
    pub fn screensaver_command(&self) -> String {
        format!("{}-screensaver-command", self.desktop.trim())
    }
}

/// Parse a yes/no style switch, as used by `--snooze-enable` and the config file.
pub fn parse_switch(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Ok(true),
        "false" | "no" | "n" | "0" | "off" => Ok(false),
        other => Err(format!("expected yes/no, got '{other}'")),
    }
}

fn deserialize_switch<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Switch {
        Bool(bool),
        Text(String),
    }

    match Switch::deserialize(deserializer)? {
        Switch::Bool(b) => Ok(Some(b)),
        Switch::Text(s) => parse_switch(&s).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Desktop named by [`DESKTOP_ENV_VAR`], if set.
///
/// Some display managers put a session file path there; only its last
/// component is kept.
pub fn env_desktop() -> Option<String> {
    std::env::var(DESKTOP_ENV_VAR)
        .ok()
        .map(|value| desktop_from_session(&value))
}

fn desktop_from_session(value: &str) -> String {
    let value = value.trim();
    let name = value.rsplit('/').next().unwrap_or(value);
    name.strip_suffix(".desktop").unwrap_or(name).to_string()
}

/// The legacy INI file next to `config_file`, if one exists.
pub fn legacy_config_beside(config_file: &Path) -> Option<PathBuf> {
    let legacy = config_file.with_file_name(LEGACY_CONFIG_NAME);
    legacy.exists().then_some(legacy)
}

/// `<config_dir>/break-timer/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// `<config_dir>/break-timer/icon.png`, or a relative `icon.png` without a config dir.
pub fn default_icon_path() -> PathBuf {
    dirs::config_dir().map_or_else(
        || PathBuf::from("icon.png"),
        |d| d.join(APP_DIR).join("icon.png"),
    )
}
