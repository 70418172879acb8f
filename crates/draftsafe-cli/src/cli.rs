//! CLI argument definitions for `draftsafe`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "draftsafe",
    version,
    about = "Versioned auto-save store for documents",
    long_about = "Keep a bounded history of document versions on disk.\n\n\
                  Save, restore, and inspect versions by key, watch a file and \
                  save it on an interval, and check the newest versions for \
                  divergent edits."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Store directory (overrides `[store] dir` in settings).
    #[arg(long = "store", value_name = "DIR", global = true)]
    pub store: Option<PathBuf>,

    /// Settings file (default: platform config directory).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Save a new version of a document.
    Save(SaveArgs),

    /// Print a saved version (the newest by default).
    Restore(RestoreArgs),

    /// List saved versions, newest first.
    History(KeyArgs),

    /// Check the two newest versions for divergent edits.
    Conflicts(ConflictsArgs),

    /// Auto-save a file while it changes, until Ctrl-C.
    Watch(WatchArgs),

    /// Delete all saved versions of a document.
    Clear(KeyArgs),

    /// Write a settings file with the current values.
    Init(InitArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing settings file.
    #[arg(long = "force")]
    pub force: bool,
}

#[derive(Args)]
pub struct KeyArgs {
    /// Document key.
    #[arg(value_name = "KEY")]
    pub key: String,
}

#[derive(Args)]
#[command(group(clap::ArgGroup::new("input").required(true).args(["content", "file"])))]
pub struct SaveArgs {
    /// Document key.
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Content as a JSON value.
    #[arg(long = "content", value_name = "JSON")]
    pub content: Option<String>,

    /// Read content from a file (JSON if it parses, text otherwise).
    #[arg(long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct RestoreArgs {
    /// Document key.
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Version id from `history` (default: newest).
    #[arg(long = "version", value_name = "ID")]
    pub version: Option<String>,

    /// Write the content to a file instead of stdout.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConflictsArgs {
    /// Document key.
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Gap in milliseconds above which differing versions conflict.
    #[arg(long = "window-ms", value_name = "MS")]
    pub window_ms: Option<u64>,
}

#[derive(Args)]
pub struct WatchArgs {
    /// Document key.
    #[arg(value_name = "KEY")]
    pub key: String,

    /// File to watch.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// How often to check the file for changes.
    #[arg(long = "poll-ms", value_name = "MS", default_value_t = 500)]
    pub poll_ms: u64,

    /// Save interval (overrides settings).
    #[arg(long = "interval-ms", value_name = "MS")]
    pub interval_ms: Option<u64>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
