//! `gridview` command-line interface.

use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use gridview_cli::config::CliConfig;
use gridview_cli::logging::{LogConfig, init_logging};
use gridview_sync::{BackendConfig, ConfiguredBackend, PreferenceSync};
use tracing::debug;
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;

use crate::cli::{Cli, Command};
use crate::commands::{run_columns, run_filter, run_query, run_show, run_sort, run_view};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(cli) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<()> {
    let mut config = CliConfig::load(cli.config.as_deref());
    if cli.offline {
        config.backend = BackendConfig::Memory;
    }
    let backend =
        ConfiguredBackend::from_config(&config.backend).context("configure preference store")?;
    debug!(backend = backend.kind(), "preference store ready");

    let runtime = tokio::runtime::Runtime::new().context("start async runtime")?;
    runtime.block_on(async {
        let sync = PreferenceSync::new(backend, config.sync);
        match &cli.command {
            Command::Show(args) => run_show(&sync, args).await,
            Command::View(args) => run_view(&sync, args).await,
            Command::Sort(args) => run_sort(&sync, args).await,
            Command::Columns(args) => run_columns(&sync, args).await,
            Command::Filter(args) => run_filter(&sync, args).await,
            Command::Query(args) => run_query(&sync, args).await,
        }
    })
}

/// Logging setup from the global flags. An explicit `-v`/`-q` or
/// `--log-level` wins over `RUST_LOG`.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let explicit = cli.verbosity.is_present() || cli.log_level.is_some();
    let level_filter = cli
        .log_level
        .map_or_else(|| cli.verbosity.tracing_level_filter(), LevelFilter::from);
    let with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    LogConfig {
        level_filter,
        use_env_filter: !explicit,
        with_ansi,
        format: cli.log_format.into(),
        log_file: cli.log_file.clone(),
        ..LogConfig::default()
    }
}
