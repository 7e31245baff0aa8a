use std::process::ExitCode;

use kilo_app::cli::DeployCli;
use kilo_app::commands::run_deploy;
use kilo_app::{bootstrap, emit, fail, parse_or_exit};
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    let cli: DeployCli = parse_or_exit();

    let (config, _guard) = match bootstrap(cli.config.as_deref()) {
        Ok(started) => started,
        Err(e) => {
            eprintln!("Failed to start: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    info!(network = %config.network, command = ?cli.command, "kilo-deploy starting");

    match run_deploy(&cli.command, &config).await {
        Ok(summary) => {
            let rendered = serde_json::to_string_pretty(&summary).unwrap_or_else(|_| summary.to_string());
            info!("deployment finished");
            emit(&rendered);
            ExitCode::SUCCESS
        }
        Err(e) => fail("Deployment failed", &e),
    }
}
