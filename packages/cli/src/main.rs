mod commands;
mod config;
mod replay;
mod script;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{replay as replay_cmd, show_config, ConfigArgs, ReplayArgs};
use tracing_subscriber::EnvFilter;

/// Easel CLI - replay canvas sessions against a scripted host
#[derive(Parser, Debug)]
#[command(name = "easel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log canvas internals to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a scripted editing session on a virtual clock
    Replay(ReplayArgs),

    /// Validate and print the effective configuration
    Config(ConfigArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|cwd| match cli.command {
            Command::Replay(args) => replay_cmd(args, &cwd),
            Command::Config(args) => show_config(args, &cwd),
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
