use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub fn default_directives(verbose: u8) -> String {
	let level = match verbose {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	};
	format!("warn,webforge={level},webforge_runtime={level},webforge_cli={level}")
}

/// Installs the stderr subscriber. `RUST_LOG` takes precedence over `-v`.
pub fn init_logging(verbose: u8) -> Result<()> {
	let filter = match EnvFilter::try_from_default_env() {
		Ok(filter) => filter,
		Err(_) => EnvFilter::try_new(default_directives(verbose)).context("invalid log filter")?,
	};

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.try_init()
		.map_err(|err| anyhow!(err))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn verbosity_raises_crate_levels_only() {
		assert_eq!(default_directives(0), "warn,webforge=warn,webforge_runtime=warn,webforge_cli=warn");
		assert!(default_directives(2).contains("webforge_runtime=debug"));
		assert!(default_directives(2).starts_with("warn,"));
		assert!(default_directives(9).contains("webforge=trace"));
	}

	#[test]
	fn default_directives_parse() {
		for verbose in 0..4 {
			assert!(EnvFilter::try_new(default_directives(verbose)).is_ok());
		}
	}
}
