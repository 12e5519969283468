// Confluo CLI
//
// Speaks newline-delimited JSON on stdio: one inbound message per input
// line, one outbound message per output line.

pub mod logging;
pub mod stdio;

use clap::Parser;
use std::path::PathBuf;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "confluo")]
#[command(about = "Multi-source completion core speaking JSON lines on stdio")]
#[command(version)]
pub struct Cli {
    /// Engine configuration file (YAML or JSON)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level written to stderr (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: String,
}
