//! draftsafe CLI.

use clap::{ColorChoice, Parser};
use draftsafe_cli::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use draftsafe_cli::commands::{
    Workspace, run_clear, run_conflicts, run_history, run_init, run_restore, run_save, run_watch,
};
use draftsafe_cli::logging::{LogConfig, LogFormat, init_logging};
use draftsafe_cli::settings::Settings;
use draftsafe_core::AutoSaveError;
use std::io::{self, IsTerminal};
use tracing::level_filters::LevelFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(error) => {
            report(&error);
            std::process::exit(1);
        }
    };
    let workspace = Workspace::new(settings, cli.store.clone());
    tracing::debug!(store = %workspace.store_dir.display(), "Using store directory");

    let result = match &cli.command {
        Command::Save(args) => run_save(&workspace, args).await.map(|_| 0),
        Command::Restore(args) => run_restore(&workspace, args).await.map(|_| 0),
        Command::History(args) => run_history(&workspace, args).await.map(|_| 0),
        Command::Conflicts(args) => run_conflicts(&workspace, args)
            .await
            .map(|found| if found > 0 { 2 } else { 0 }),
        Command::Watch(args) => run_watch(&workspace, args).await.map(|_| 0),
        Command::Clear(args) => run_clear(&workspace, args).await.map(|()| 0),
        Command::Init(args) => {
            let path = cli.config.clone().unwrap_or_else(Settings::config_path);
            run_init(&workspace, &path, args).map(|()| 0)
        }
    };
    let exit_code = match result {
        Ok(code) => code,
        Err(error) => {
            report(&error);
            1
        }
    };
    std::process::exit(exit_code);
}

/// Print an error, with a hint for auto-save errors.
fn report(error: &anyhow::Error) {
    match error.downcast_ref::<AutoSaveError>() {
        Some(autosave) => {
            eprintln!("error: {}", autosave.user_message());
            if let Some(suggestion) = autosave.suggestion() {
                eprintln!("hint: {suggestion}");
            }
        }
        None => eprintln!("error: {error:#}"),
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
