//! CLI argument parsing with clap.

use clap::Parser;
use std::path::PathBuf;

use crate::diagnostic::OutputFormat;
use crate::settings::ReachabilityPolicy;

#[derive(Parser, Debug)]
#[command(name = "rulecheck")]
#[command(author, version, about = "Lint proxy rule lists and rule-set/proxy-group configuration")]
pub struct Cli {
    /// Root directory holding the .list files and the config
    /// (default: discovered from the executable or current directory)
    #[arg(long, env = "RULECHECK_ROOT")]
    pub root: Option<PathBuf>,

    /// Config file path, relative to the root
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Settings file (default: <root>/rulecheck.yaml when present)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// What an unreachable remote rule-set is: fail, warn, skip
    #[arg(long)]
    pub reachability: Option<ReachabilityPolicy>,

    /// Reachability probe timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Output format (text, json)
    #[arg(long, short, default_value = "text")]
    pub format: OutputFormat,

    /// Quiet mode (errors only in logs)
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long)]
    pub verbose: bool,
}
