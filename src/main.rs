mod cli;
mod commands;
mod config;
mod editor;
mod logging;
mod model;
mod session;
mod timer;
mod ui;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let command = args.command.unwrap_or(cli::Command::Tui);
    match command {
        cli::Command::Tui => commands::tui(args.config, args.minutes),
        cli::Command::Config { init } => commands::show_config(args.config, init),
    }
}
