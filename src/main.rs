use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use common::cli::{CommonArgs, CommonCommands, QueryArgs, utils};
use export::Outcome;

#[derive(Parser, Debug)]
#[command(name = "promcsv", version, about = "Query Prometheus and print the result as CSV")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    query: QueryArgs,

    #[command(subcommand)]
    command: Option<CommonCommands>,
}

impl Cli {
    async fn run(self) -> Result<ExitCode> {
        utils::init_logging(&self.common);

        let config = utils::load_config(self.common.config.as_ref(), &self.query)?;
        tracing::debug!(url = %config.url, query = %config.query, "configuration loaded");

        match self.command {
            Some(CommonCommands::Config { json }) => {
                println!("{}", utils::display_config(&config, json)?);
                Ok(ExitCode::SUCCESS)
            }
            Some(CommonCommands::Validate) => match export::validate(&config) {
                Ok(()) => {
                    println!("Configuration is valid");
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    println!("error: {e}");
                    Ok(ExitCode::FAILURE)
                }
            },
            None => {
                let mut out = io::stdout().lock();
                let mut err = io::stderr().lock();
                let outcome = export::run(&config, &mut out, &mut err)
                    .await
                    .context("Failed to write output")?;
                Ok(match outcome {
                    Outcome::Exported | Outcome::Reported => ExitCode::SUCCESS,
                    Outcome::Aborted => ExitCode::FAILURE,
                })
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            for cause in e.chain().skip(1) {
                eprintln!("  caused by: {cause}");
            }
            ExitCode::FAILURE
        }
    }
}
