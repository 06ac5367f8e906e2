//! novachat: terminal front end for the NovaChat support agent.

mod chat;
mod cli;
mod commands;
mod dotenv;
mod render;

use std::path::PathBuf;

use novachat_common::Result;
use novachat_config::toml_loader::{default_config_path, load_from_path};
use novachat_config::LogLevel;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::EnvFilter;

use crate::cli::{Args, Command};

/// Log directive: `--log-level` wins, then `logging.level` from the config file.
fn log_directive(args: &Args, config_path: &std::path::Path) -> String {
    if let Some(directive) = &args.log_level {
        return directive.clone();
    }
    load_from_path(config_path)
        .map(|config| config.logging.level)
        .unwrap_or_default()
        .directive()
}

fn init_logging(directive: &str) {
    let directive = directive
        .parse::<Directive>()
        .or_else(|_| LogLevel::default().directive().parse::<Directive>())
        .unwrap_or_else(|_| LevelFilter::INFO.into());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config_path(args: &Args) -> Result<PathBuf> {
    match &args.config {
        Some(path) => Ok(path.clone()),
        None => Ok(default_config_path()?),
    }
}

async fn run(args: Args, config_path: PathBuf) -> Result<()> {
    match args.command() {
        Command::Chat => chat::run(config_path).await,
        Command::Embed => {
            println!("{}", commands::embed(&config_path)?);
            Ok(())
        }
        Command::RotateKey => {
            println!("{}", commands::rotate_key(&config_path)?);
            Ok(())
        }
        Command::ShowConfig => {
            println!("{}", commands::show_config(&config_path)?);
            Ok(())
        }
    }
}

fn build_runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}

fn main() {
    let args = cli::parse();

    let config_path = match resolve_config_path(&args) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("novachat: {e}");
            std::process::exit(1);
        }
    };

    // Environment is mutated only here, before any runtime thread exists.
    dotenv::load(Some(&config_path));
    init_logging(&log_directive(&args, &config_path));

    tracing::info!("NovaChat v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::debug!(path = %config_path.display(), "using config");

    let runtime = match build_runtime() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "failed to start async runtime");
            eprintln!("novachat: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(args, config_path)) {
        tracing::error!(error = %e, "novachat failed");
        eprintln!("novachat: {e}");
        std::process::exit(1);
    }
}
