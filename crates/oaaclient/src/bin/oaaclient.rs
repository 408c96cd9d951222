//! Pushes OAA payloads and builds assessment reports from JSON files.
//!
//! Reads `VEZA_URL` (unless `--host` is given) and `VEZA_API_KEY` from the
//! environment. Logging follows `RUST_LOG`, defaulting to `info`.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use oaaclient::cli::{self, Cli};
use oaaclient::client::{ClientError, OaaClient};
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let args = Cli::parse();
    init_tracing(args.log_json);

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    match runtime.block_on(run(&args)) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(error) => {
            cli::write_error(&error, &mut io::stderr().lock()).wrap_err("write error report")?;
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn run(args: &Cli) -> Result<(), ClientError> {
    let config = args.client_config()?;
    let client = OaaClient::connect(config).await?;
    let mut stdout = io::stdout().lock();
    cli::run(&client, &args.command, &mut stdout).await?;
    stdout.flush()?;
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_writer(io::stderr);
    let outcome = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(error) = outcome {
        warn!(error = %error, "tracing init failed");
    }
}
