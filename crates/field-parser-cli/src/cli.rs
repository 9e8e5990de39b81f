//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "fieldparse",
    version,
    about = "Parse log timestamps and apply field helpers to NDJSON events"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// TOML config file (tzdb_path, default_locale).
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse timestamps with a format, an alias or a sample timestamp.
    Parse(ParseArgs),

    /// Apply helpers to NDJSON events read from stdin.
    Apply(ApplyArgs),

    /// List the named format aliases.
    Aliases,
}

/// Options shared by commands that build parsers.
#[derive(Args)]
pub struct EngineArgs {
    /// Timezone database file (overrides the config).
    #[arg(long, value_name = "PATH")]
    pub tzdb: Option<PathBuf>,

    /// Fixed processing time (RFC 3339), used for formats without a year.
    #[arg(long, value_name = "RFC3339")]
    pub now: Option<String>,
}

#[derive(Args)]
pub struct ParseArgs {
    /// Format string, alias name or sample timestamp.
    #[arg(short, long)]
    pub format: String,

    /// Locale for weekday/month names (defaults to the configured locale).
    #[arg(short, long)]
    pub locale: Option<String>,

    #[command(flatten)]
    pub engine: EngineArgs,

    /// Values to parse.
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<String>,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Helper definition `target: name(args)`, applied in the order given.
    #[arg(long = "helper", required = true, value_name = "DEFINITION")]
    pub helpers: Vec<String>,

    #[command(flatten)]
    pub engine: EngineArgs,
}
