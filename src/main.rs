//! Bing photo CLI - fetch Bing's image of the day
//!
//! Prints the URLs of the requested images and, with `--cache`, downloads them
//! into a cache directory.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bingphoto::cli::{render, Cli, CliError};
use bingphoto::config::{system_locale, Configuration};
use bingphoto::BingPhoto;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<String, Box<dyn std::error::Error>> {
    let config = Configuration::normalize(cli.raw_options()?, &system_locale());

    let photo = tokio::time::timeout(Duration::from_secs(cli.timeout), BingPhoto::new(config))
        .await
        .map_err(|_| CliError::Timeout(cli.timeout))??;

    Ok(render(&photo, cli.json)?)
}
