//! Regio CLI: inspect selector tables and probe page regions
//!
//! ## Usage
//!
//! ```bash
//! regio check regions.yaml                  # Validate a configuration
//! regio list regions.yaml --format json     # Every region and its selector
//! regio plan regions.yaml "results[2].title"  # CSS lookups of a path
//! regio probe regions.yaml inbox results    # Read a live region (feature `browser`)
//! ```

use clap::Parser;
use regio_cli::{
    handlers::{run_check, run_list, run_plan, run_probe},
    logging::init_logging,
    Cli, CliConfig, CliResult, ColorChoice, Commands, Reporter, Verbosity,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = build_config(&cli);
    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());

    match run(&cli, &config, &reporter) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            reporter.failure(&format!("Error: {e}"));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: &CliConfig, reporter: &Reporter) -> CliResult<()> {
    init_logging(config)?;

    match &cli.command {
        Commands::Check(args) => run_check(config, args, reporter),
        Commands::List(args) => run_list(config, args, reporter),
        Commands::Plan(args) => run_plan(config, args, reporter),
        Commands::Probe(args) => run_probe(config, args, reporter),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.into();

    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(color)
        .with_log_json(cli.log_json)
        .with_base_url(cli.base_url.clone())
}
