use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use kilo_app::cli::DecodeCli;
use kilo_app::{bootstrap, emit, fail, parse_or_exit};
use kilo_core::LaunchpadConfig;
use kilo_decoder::ErrorDecoder;
use kilo_ledger::{Endpoints, MirrorClient};

async fn run(cli: &DecodeCli, config: &LaunchpadConfig) -> Result<String> {
    let endpoints = Endpoints::resolve(cli.network, None, config.mirror_url.as_deref())?;
    let mirror = MirrorClient::new(
        endpoints.mirror_url,
        Duration::from_secs(config.request_timeout_secs),
    )?;
    let decoder = ErrorDecoder::new(cli.network, &cli.contract_id, &config.artifacts_dir, mirror)?;
    decoder.decode().await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli: DecodeCli = parse_or_exit();

    let (config, _guard) = match bootstrap(cli.config.as_deref()) {
        Ok(started) => started,
        Err(e) => {
            eprintln!("Failed to start: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(&cli, &config).await {
        Ok(report) => {
            emit(&report);
            ExitCode::SUCCESS
        }
        Err(e) => fail("Error decoder failed", &e),
    }
}
