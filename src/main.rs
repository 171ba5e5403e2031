use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use buildcost::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    init_tracing();

    match args.command {
        cli::Commands::Estimate { ref input, json } => {
            commands::estimate::execute(&args.config, input, json).await?;
        }
        cli::Commands::Config { ref action } => match action {
            cli::ConfigCommands::Show => commands::config::show(&args.config)?,
            cli::ConfigCommands::Validate => commands::config::validate(&args.config)?,
        },
        cli::Commands::Version => {
            println!("buildcost v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
