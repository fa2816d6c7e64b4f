mod cli;
mod logging;
mod reporter;
mod signal;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use engine_logging::engine_debug;
use rrip_core::Stats;
use rrip_engine::{ReqwestFetcher, RunContext, TerminationController};

use crate::cli::Cli;
use crate::reporter::TerminalReporter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let settings = cli.into_settings()?;
    logging::initialize(settings.log_level(), settings.log_file.as_deref());
    engine_debug!("{:?}", settings.run);

    let mut logs = settings.link_logs()?;
    let fetcher = ReqwestFetcher::new(settings.fetch.clone()).context("cannot build HTTP client")?;
    let reporter = TerminalReporter::stderr();
    let termination = TerminationController::new();
    let listener = signal::spawn_interrupt_listener(termination.clone());

    let ctx = RunContext {
        config: &settings.run,
        api_base: &settings.fetch.api_base,
        fetcher: &fetcher,
        sink: &reporter,
        termination: &termination,
    };
    let mut stats = Stats::new();
    let result = rrip_engine::run(&ctx, &mut logs, &mut stats).await;
    listener.abort();

    let reason = result.context("run aborted")?;
    engine_debug!("run ended: {reason}");
    Ok(ExitCode::from(reason.exit_code()))
}
