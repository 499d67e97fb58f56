//! tremor-baseline entry point

use clap::Parser;
use tremor_cli::{commands, init_logging, Cli, Settings};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet, cli.log_json);

    let settings = Settings::resolve(cli.config.as_deref(), &cli.tuning)?;
    let report = commands::execute(&cli.command, &settings)?;
    println!("{}", report);

    Ok(())
}
