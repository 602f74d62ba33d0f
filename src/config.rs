use crate::timer::{clamp_minutes, DEFAULT_MINUTES};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const MIN_REFRESH_MS: u64 = 10;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Default countdown length in minutes (1-60).
    #[serde(deserialize_with = "clamped_minutes")]
    pub timer_minutes: u32,
    /// Redraw interval of the TUI, which is also how often the timer is polled.
    pub refresh_ms: u64,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ConfigLocation {
    pub path: PathBuf,
    pub exists: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            timer_minutes: DEFAULT_MINUTES,
            refresh_ms: 100,
            log_level: "info".into(),
            log_file: None,
        }
    }
}

impl Config {
    fn normalized(mut self) -> Self {
        self.timer_minutes = clamp_minutes(self.timer_minutes.into());
        self.refresh_ms = self.refresh_ms.max(MIN_REFRESH_MS);
        self
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        match &self.log_file {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join("thoughtstream.log")),
        }
    }
}

pub fn locate_config(explicit: Option<PathBuf>) -> Result<ConfigLocation> {
    let path = match explicit {
        Some(path) => path,
        None => project_dirs()?.config_dir().join("config.yml"),
    };
    let exists = path.exists();
    Ok(ConfigLocation { path, exists })
}

/// Missing files yield defaults; a file that exists but does not parse is an
/// error.
pub fn load_config(location: &ConfigLocation) -> Result<Config> {
    if !location.path.exists() {
        return Ok(Config::default());
    }
    read_config(&location.path)
}

fn read_config(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    if data.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config =
        serde_yaml::from_str(&data).with_context(|| format!("parsing config {:?}", path))?;
    Ok(config.normalized())
}

pub fn save_config(location: &ConfigLocation, config: &Config) -> Result<()> {
    if let Some(parent) = location.path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let serialized = serde_yaml::to_string(config).context("serializing config")?;
    fs::write(&location.path, serialized)
        .with_context(|| format!("writing {:?}", location.path))?;
    Ok(())
}

fn clamped_minutes<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    i64::deserialize(deserializer).map(clamp_minutes)
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "thoughtstream").context("locating config directory")
}
