use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// NovaChat: a streaming AI support chat for the terminal.
#[derive(Parser, Debug)]
#[command(name = "novachat", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter directive (e.g. `novachat=debug`). Overrides `logging.level`.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Chat with the agent (default).
    Chat,
    /// Print the website integration snippet.
    Embed,
    /// Generate a new project key and save it.
    RotateKey,
    /// Print the effective configuration as JSON.
    ShowConfig,
}

impl Args {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat)
    }
}

pub fn parse() -> Args {
    Args::parse()
}
