use crate::config::{load_config, locate_config, save_config, Config};
use crate::logging;
use crate::timer::clamp_minutes;
use crate::ui;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

pub fn tui(config_path: Option<PathBuf>, minutes: Option<i64>) -> Result<()> {
    let location = locate_config(config_path)?;
    let mut config = load_config(&location)?;
    apply_minutes_override(&mut config, minutes);
    let log_path = config.log_path()?;
    logging::init(&config.log_level, &log_path)?;
    info!(
        config = %location.path.display(),
        timer_minutes = config.timer_minutes,
        "starting session"
    );
    let result = ui::run(&config);
    info!("session closed");
    result
}

/// `--minutes` wins over the config file; out-of-range values are clamped.
fn apply_minutes_override(config: &mut Config, minutes: Option<i64>) {
    if let Some(m) = minutes {
        config.timer_minutes = clamp_minutes(m);
    }
}

pub fn show_config(config_path: Option<PathBuf>, init: bool) -> Result<()> {
    let location = locate_config(config_path)?;
    if init {
        if location.exists {
            println!("Config already exists at {}", location.path.display());
        } else {
            save_config(&location, &Config::default())?;
            println!("Wrote default config to {}", location.path.display());
        }
    }
    let config = load_config(&location)?;
    println!(
        "Config: {} ({})",
        location.path.display(),
        if location.path.exists() {
            "file"
        } else {
            "defaults"
        }
    );
    let rendered = serde_yaml::to_string(&config).context("serializing config")?;
    print!("{}", rendered);
    println!("log: {}", config.log_path()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn minutes_from_args(args: &[&str]) -> u32 {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut config = Config::default();
        apply_minutes_override(&mut config, cli.minutes);
        config.timer_minutes
    }

    #[test]
    fn minutes_flag_overrides_config() {
        assert_eq!(minutes_from_args(&["thoughtstream", "--minutes", "25"]), 25);
    }

    #[test]
    fn minutes_flag_is_clamped() {
        assert_eq!(minutes_from_args(&["thoughtstream", "--minutes", "-5"]), 1);
        assert_eq!(minutes_from_args(&["thoughtstream", "--minutes", "0"]), 1);
        assert_eq!(minutes_from_args(&["thoughtstream", "-m", "600"]), 60);
    }

    #[test]
    fn missing_flag_keeps_config_value() {
        let mut config = Config {
            timer_minutes: 12,
            ..Config::default()
        };
        apply_minutes_override(&mut config, None);
        assert_eq!(config.timer_minutes, 12);
    }
}
