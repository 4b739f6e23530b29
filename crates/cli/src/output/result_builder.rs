use std::io::{self, Write};
use std::time::Instant;

use serde::Serialize;

use crate::output::format::OutputFormat;
use crate::output::model::{CommandError, CommandResult, SCHEMA_VERSION};

/// Builder for constructing command results.
pub struct ResultBuilder<T: Serialize> {
	command: String,
	data: Option<T>,
	error: Option<CommandError>,
	start_time: Instant,
}

impl<T: Serialize> ResultBuilder<T> {
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			command: command.into(),
			data: None,
			error: None,
			start_time: Instant::now(),
		}
	}

	/// Measures the duration from `start` instead of from construction.
	pub fn started_at(mut self, start: Instant) -> Self {
		self.start_time = start;
		self
	}

	pub fn data(mut self, data: T) -> Self {
		self.data = Some(data);
		self
	}

	pub fn error(mut self, error: CommandError) -> Self {
		self.error = Some(error);
		self
	}

	pub fn build(self) -> CommandResult<T> {
		CommandResult {
			schema_version: SCHEMA_VERSION,
			ok: self.error.is_none(),
			command: self.command,
			data: self.data,
			error: self.error,
			duration_ms: Some(self.start_time.elapsed().as_millis() as u64),
		}
	}
}

/// Prints a result. In text mode only errors are printed; commands render
/// their own text output.
pub fn print_result<T: Serialize>(result: &CommandResult<T>, format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			if let Ok(json) = serde_json::to_string_pretty(result) {
				println!("{json}");
			}
		}
		OutputFormat::Text => {
			if let Some(ref error) = result.error {
				print_error_stderr(error);
			}
		}
	}
}

/// Print a command error to stderr.
pub fn print_error_stderr(error: &CommandError) {
	let _ = writeln!(io::stderr().lock(), "Error [{}]: {}", error.code, error.message);
}
