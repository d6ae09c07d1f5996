use anyhow::Context;
use clap::Parser;
use singapore_solar::cli::{run, Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = match &cli.command {
        Commands::Run { .. } => "run",
        Commands::Validate { .. } => "validate",
        Commands::Info { .. } => "info",
    };
    run(cli).with_context(|| format!("sg-solar {} failed", command))
}
