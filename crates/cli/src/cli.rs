use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use webforge::GenerationSession;
use webforge::protocol::{Backend, ColorScheme, Database, Frontend, Layout, StylePreferences, TechStack, Theme};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "webforge")]
#[command(about = "Generate full-stack applications from a description")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Read configuration from FILE instead of the default location
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Output format
	#[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
	pub format: OutputFormat,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Start a generation and follow its progress until it settles
	#[command(alias = "gen")]
	Generate(GenerateArgs),

	/// Show the signed-in user and their usage
	Whoami,

	/// End the server-side session
	Logout,

	/// Print the browser URL that starts sign-in
	LoginUrl {
		/// OAuth provider
		#[arg(long, default_value = "github")]
		provider: String,
	},

	/// Check whether a client route is reachable for the current user
	Route {
		/// Full path, e.g. /results/42?tab=files
		path: String,
	},
}

impl Commands {
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Generate(_) => "generate",
			Commands::Whoami => "whoami",
			Commands::Logout => "logout",
			Commands::LoginUrl { .. } => "login-url",
			Commands::Route { .. } => "route",
		}
	}
}

#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
	/// What the application should do
	#[arg(short, long)]
	pub description: String,

	/// Feature to include (repeatable)
	#[arg(long = "feature", value_name = "FEATURE")]
	pub features: Vec<String>,

	#[arg(long)]
	pub frontend: Option<Frontend>,

	#[arg(long)]
	pub backend: Option<Backend>,

	#[arg(long)]
	pub database: Option<Database>,

	#[arg(long)]
	pub theme: Option<Theme>,

	#[arg(long)]
	pub color_scheme: Option<ColorScheme>,

	#[arg(long)]
	pub layout: Option<Layout>,
}

impl GenerateArgs {
	/// Fills the wizard of `session` from these arguments.
	pub fn apply_to(&self, session: &mut GenerationSession) {
		session.set_description(self.description.trim());
		for feature in &self.features {
			session.add_feature(feature.as_str());
		}

		let mut stack = TechStack::default();
		if let Some(frontend) = self.frontend {
			stack.frontend = frontend;
		}
		if let Some(backend) = self.backend {
			stack.backend = backend;
		}
		if let Some(database) = self.database {
			stack.database = database;
		}
		session.set_tech_stack(stack);

		let mut style = StylePreferences::default();
		if let Some(theme) = self.theme {
			style.theme = theme;
		}
		if let Some(color_scheme) = self.color_scheme {
			style.color_scheme = color_scheme;
		}
		if let Some(layout) = self.layout {
			style.layout = layout;
		}
		session.set_style_preferences(style);
	}
}
