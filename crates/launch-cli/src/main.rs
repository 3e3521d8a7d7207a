mod bootstrap;
mod cli_args;
mod commands;

use anyhow::Result;
use clap::Parser;

use crate::bootstrap::{init_tracing, load_settings};
use crate::cli_args::{Cli, CliCommand};
use crate::commands::{render_report, run_provision, run_session_url, run_slug};

async fn run_cli(cli: Cli) -> Result<()> {
    match &cli.command {
        CliCommand::Slug(args) => {
            println!("{}", run_slug(args)?);
        }
        CliCommand::SessionUrl(args) => {
            let settings = load_settings(cli.config.as_deref())?;
            println!("{}", run_session_url(&settings, args).await?);
        }
        CliCommand::Provision(args) => {
            let settings = load_settings(cli.config.as_deref())?;
            let report = run_provision(settings, args).await?;
            println!("{}", render_report(&report)?);
            if !report.success {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run_cli(cli).await
}
