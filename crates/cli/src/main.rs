use std::process::ExitCode;

use clap::Parser;
use webforge_cli::cli::Cli;
use webforge_cli::{commands, logging};

#[tokio::main]
async fn main() -> ExitCode {
	let cli = Cli::parse();
	if let Err(err) = logging::init_logging(cli.verbose) {
		eprintln!("warning: logging disabled: {err:#}");
	}

	if commands::dispatch(cli).await { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
