//! CLI argument parsing for qmpanel.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "qmpanel")]
#[command(about = "Lightweight desktop panel: menu, quick launch, taskbar and clock", version)]
pub struct Cli {
    /// Enable debug logging (logs to /tmp/qmpanel.log)
    #[arg(short, long)]
    pub debug: bool,

    /// Config file to use instead of ~/.config/qmpanel/config.json
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Skip the startup commands listed under "launch"
    #[arg(long)]
    pub no_autostart: bool,
}
