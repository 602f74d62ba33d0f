use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "thoughtstream",
    version,
    about = "Terminal journal with a writing timer"
)]
pub struct Cli {
    /// Timer length in minutes (1-60), overrides the config file
    #[arg(long, short = 'm', allow_negative_numbers = true)]
    pub minutes: Option<i64>,
    /// Path to the config file
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Launch the interactive journal (default)
    Tui,
    /// Show the effective configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_minutes_reach_the_parser() {
        let cli = Cli::try_parse_from(["thoughtstream", "--minutes", "-5"]).unwrap();
        assert_eq!(cli.minutes, Some(-5));
        assert!(cli.command.is_none());
    }

    #[test]
    fn minutes_combine_with_subcommand() {
        let cli = Cli::try_parse_from(["thoughtstream", "-m", "90", "tui"]).unwrap();
        assert_eq!(cli.minutes, Some(90));
        assert!(matches!(cli.command, Some(Command::Tui)));
    }

    #[test]
    fn config_init_flag() {
        let cli = Cli::try_parse_from(["thoughtstream", "config", "--init"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Config { init: true })));
        assert_eq!(cli.minutes, None);
    }
}
