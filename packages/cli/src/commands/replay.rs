use crate::config::resolve;
use crate::replay::{replay as run_replay, ReplayReport, TimedEvent};
use crate::script::Script;
use anyhow::Result;
use clap::Args;
use colored::{ColoredString, Colorize};
use easel_editor::EditorEvent;
use easel_sync::SyncState;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Replay script (.json)
    pub script: PathBuf,

    /// Config file (overrides the script's and ./easel.config.json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Also print the final snapshot
    #[arg(long)]
    pub snapshot: bool,
}

pub fn replay(args: ReplayArgs, cwd: &Path) -> Result<()> {
    let script = Script::from_file(&args.script)?;
    let (config, source) = resolve(args.config.as_deref(), script.config.clone(), cwd)?;
    let report = run_replay(&script, config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("▶ {} {}", "Replaying".green().bold(), args.script.display());
    println!("   Config: {}", source);
    println!();

    for event in &report.events {
        print_event(event);
    }
    for error in &report.errors {
        println!(
            "{:>8}  {} step {}: {}",
            format!("{}ms", error.at_ms),
            "✗".red(),
            error.step,
            error.message
        );
    }

    print_summary(&report);
    if args.snapshot {
        println!();
        println!("{}", serde_json::to_string_pretty(&report.final_snapshot)?);
    }
    Ok(())
}

fn label(event: &EditorEvent) -> ColoredString {
    match event {
        EditorEvent::SnapshotSubmitted { .. } => "submit".cyan(),
        EditorEvent::SyncStateChanged { state: SyncState::Synced } => "synced".green(),
        EditorEvent::SyncStateChanged { state: SyncState::Failed } => "failed".red(),
        EditorEvent::SyncStateChanged { .. } => "state".normal(),
        EditorEvent::SyncRetrying { .. } => "retry".yellow(),
        EditorEvent::SyncFailed { .. } => "error".red().bold(),
        EditorEvent::RolledBack { .. } => "rollback".red(),
        EditorEvent::Recovered { .. } => "recover".blue(),
        EditorEvent::BridgeUnavailable => "offline".red(),
        EditorEvent::DragStarted { .. } => "drag".magenta(),
        EditorEvent::DropZoneChanged { .. } => "zone".dimmed(),
        EditorEvent::DropCommitted { .. } => "drop".green(),
        EditorEvent::DropRejected { .. } => "reject".yellow(),
        EditorEvent::DragCancelled { .. } => "cancel".yellow(),
        EditorEvent::ElementRemoved { .. } => "remove".magenta(),
    }
}

fn print_event(timed: &TimedEvent) {
    println!(
        "{:>8}  {:<8}  {}",
        format!("{}ms", timed.at_ms),
        label(&timed.event),
        timed.event
    );
}

fn print_summary(report: &ReplayReport) {
    println!();
    let state = match report.final_state {
        SyncState::Synced => "synced".green().bold(),
        SyncState::Syncing => "syncing".yellow().bold(),
        SyncState::Failed => "failed".red().bold(),
    };
    println!("✨ {} Replay complete", "Done".green().bold());
    println!("   Final state:  {}", state);
    println!("   Submissions:  {}", report.submissions);
    println!("   Elapsed:      {}ms", report.elapsed_ms);
    if !report.errors.is_empty() {
        println!("   {} {}", "Refused steps:".yellow(), report.errors.len());
    }
}
