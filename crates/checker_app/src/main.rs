mod cli;
mod commands;
mod config;
mod persistence;
mod render;

use std::process::ExitCode;

use anyhow::Result;
use checker_logging::{checker_error, checker_info, LogDestination};
use clap::Parser;
use log::LevelFilter;
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, Command};
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            checker_error!("{:#}", err);
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_overrides(&cli);

    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    match cli.command {
        Command::Check { text, file, report } => {
            commands::run_check(&config, &text.join(" "), file.as_deref(), report, &cancel).await
        }
        Command::Report { id } => commands::run_report(&config, id).await.map(|_| true),
        Command::Dashboard { cycles } => {
            commands::run_dashboard(&config, cycles, &cancel).await.map(|()| true)
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let destination = match &cli.log_file {
        Some(path) => LogDestination::Both(path.clone()),
        None => LogDestination::Terminal,
    };
    checker_logging::initialize(destination, level);
}

fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            checker_info!("Interrupt received, cancelling");
            cancel.cancel();
        }
    });
}
