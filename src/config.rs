use std::{
    ops::Not,
    path::{Path, PathBuf},
};

use eframe::egui;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

const APP_NAME: &str = "wheel_alarm";

#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Not for Theme {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

impl From<Theme> for egui::Visuals {
    fn from(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// chrono format used for alarm times
    #[serde(default = "default_time_format")]
    pub time_format: String,
    #[serde(default)]
    pub theme: Theme,
    /// where the alarm list, saved sounds and sound files live
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// how often the scheduler checks for due alarms
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

fn default_time_format() -> String {
    "%l:%M %p".to_string()
}

const fn default_tick_millis() -> u64 {
    500
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_format: default_time_format(),
            theme: Theme::Dark,
            data_dir: None,
            tick_millis: default_tick_millis(),
        }
    }
}

fn project_dirs() -> ConfigResult<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME).ok_or(ConfigError::NoProjectDirs)
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// if the file can't be read or isn't a valid config
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let config = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&config)?)
    }

    /// Like [`Config::load`] but a missing file gives the defaults.
    ///
    /// # Errors
    /// if the file exists but can't be read or parsed
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            log::info!("no config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// # Errors
    /// if the config directory can't be created or the file can't be written
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let config = toml::to_string(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, config)?;
        Ok(())
    }

    /// # Errors
    /// if there is no home directory to put the config in
    pub fn config_path() -> ConfigResult<PathBuf> {
        let mut path = project_dirs()?.config_dir().to_path_buf();
        path.push("config.toml");
        Ok(path)
    }

    /// # Errors
    /// if no `data_dir` is configured and there is no home directory
    pub fn data_path(&self) -> ConfigResult<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(project_dirs()?.data_dir().to_path_buf()),
        }
    }

    /// # Errors
    /// see [`Config::data_path`]
    pub fn sounds_path(&self) -> ConfigResult<PathBuf> {
        let mut path = self.data_path()?;
        path.push("sounds");
        Ok(path)
    }

    #[must_use]
    pub fn tick(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_millis.max(1))
    }
}
