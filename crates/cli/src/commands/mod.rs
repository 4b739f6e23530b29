mod auth;
mod generate;

use std::time::Instant;

use serde::Serialize;
use tracing::error;
use webforge::{ClientConfig, HttpApiClient};

use crate::cli::{Cli, Commands};
use crate::output::{CommandError, ErrorCode, OutputFormat, ResultBuilder, print_result};

/// Runs the parsed command line. Returns `false` when the command failed.
pub async fn dispatch(cli: Cli) -> bool {
	let format = cli.format;
	let name = cli.command.name();
	let start = Instant::now();

	let outcome = match ClientConfig::load(cli.config.as_deref()) {
		Ok(config) => run(cli.command, &config, format, start).await,
		Err(err) => Err(CommandError::new(ErrorCode::ConfigError, err.to_string())),
	};

	match outcome {
		Ok(()) => true,
		Err(err) => {
			error!(target = "webforge.cli", command = name, code = %err.code, error = %err.message, "command failed");
			print_result(&ResultBuilder::<()>::new(name).started_at(start).error(err).build(), format);
			false
		}
	}
}

async fn run(command: Commands, config: &ClientConfig, format: OutputFormat, start: Instant) -> Result<(), CommandError> {
	match command {
		Commands::Generate(args) => generate::execute(config, &args, format, start).await,
		Commands::Whoami => auth::whoami(config, format, start).await,
		Commands::Logout => auth::logout(config, format, start).await,
		Commands::LoginUrl { provider } => {
			auth::login_url(config, &provider, format, start);
			Ok(())
		}
		Commands::Route { path } => auth::route(config, &path, format, start).await,
	}
}

fn api_client(config: &ClientConfig) -> Result<HttpApiClient, CommandError> {
	Ok(HttpApiClient::new(config.clone())?)
}

/// Prints a successful result in JSON mode; text output is left to the command.
fn emit<T: Serialize>(command: &str, data: T, format: OutputFormat, start: Instant) {
	if format == OutputFormat::Json {
		print_result(&ResultBuilder::new(command).started_at(start).data(data).build(), format);
	}
}
