//! tame CLI entry point

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use tame::commands::{run_describe, run_graph, run_search, run_validate, CommandContext};
use tame::{Cli, Commands, TameError};

const NO_ROOT_MESSAGE: &str = "\
No root 'tame.yaml' file found. This is needed for metadata tracking!

If you did want to track metadata, add a (possibly empty) tame.yaml
file to the most top-level directory from which you want to track.";

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e @ TameError::UntrackedRepository { .. }) => {
            tracing::debug!("{}", e);
            eprintln!("{}", NO_ROOT_MESSAGE);
            e.exit_code()
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the default level
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "tame=debug" } else { "tame=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> tame::Result<String> {
    let ctx = CommandContext::from_cli(cli.format, cli.verbose);
    match &cli.command {
        Commands::Validate(args) => run_validate(args, &ctx),
        Commands::Search(args) => run_search(args, &ctx),
        Commands::Describe(args) => run_describe(args, &ctx),
        Commands::Graph(args) => run_graph(args, &ctx),
    }
}
