use crate::config::resolve;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Config file (defaults to ./easel.config.json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

pub fn show_config(args: ConfigArgs, cwd: &Path) -> Result<()> {
    let (config, source) = resolve(args.config.as_deref(), None, cwd)?;

    eprintln!("{} Configuration valid ({})", "✓".green(), source);
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
