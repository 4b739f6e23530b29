//! Wizard option sets and the generation request body.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Returned when a string does not name a member of an option set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOption {
	pub kind: &'static str,
	pub value: String,
}

impl fmt::Display for UnknownOption {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "unknown {} option: {}", self.kind, self.value)
	}
}

impl std::error::Error for UnknownOption {}

macro_rules! option_set {
	(
		$(#[$meta:meta])*
		$name:ident ($kind:literal), default = $default:ident {
			$($variant:ident => $wire:literal),+ $(,)?
		}
	) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
		pub enum $name {
			$(
				#[serde(rename = $wire)]
				$variant,
			)+
		}

		impl $name {
			/// Every selectable value, in display order.
			pub const ALL: &'static [$name] = &[$($name::$variant),+];

			/// Wire representation of this option.
			pub fn as_str(self) -> &'static str {
				match self {
					$($name::$variant => $wire,)+
				}
			}
		}

		impl Default for $name {
			fn default() -> Self {
				$name::$default
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(self.as_str())
			}
		}

		impl FromStr for $name {
			type Err = UnknownOption;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				let wanted = s.trim().to_ascii_lowercase();
				$name::ALL
					.iter()
					.copied()
					.find(|option| option.as_str() == wanted)
					.ok_or_else(|| UnknownOption {
						kind: $kind,
						value: s.to_string(),
					})
			}
		}
	};
}

option_set! {
	/// Frontend framework of the generated application.
	Frontend ("frontend"), default = React {
		React => "react",
		Vue => "vue",
		Angular => "angular",
		Svelte => "svelte",
		NextJs => "nextjs",
	}
}

option_set! {
	/// Backend runtime of the generated application.
	Backend ("backend"), default = NodeJs {
		NodeJs => "nodejs",
		Django => "django",
		FastApi => "fastapi",
		Flask => "flask",
		Express => "express",
	}
}

option_set! {
	/// Database of the generated application.
	Database ("database"), default = PostgreSql {
		PostgreSql => "postgresql",
		MySql => "mysql",
		MongoDb => "mongodb",
		Sqlite => "sqlite",
	}
}

option_set! {
	/// Visual theme.
	Theme ("theme"), default = Modern {
		Modern => "modern",
		Minimal => "minimal",
		Classic => "classic",
		Playful => "playful",
	}
}

option_set! {
	/// Primary color scheme.
	ColorScheme ("color scheme"), default = Blue {
		Blue => "blue",
		Green => "green",
		Purple => "purple",
		Red => "red",
		Orange => "orange",
		Dark => "dark",
	}
}

option_set! {
	/// Page layout archetype.
	Layout ("layout"), default = Dashboard {
		Dashboard => "dashboard",
		Landing => "landing",
		Blog => "blog",
		Ecommerce => "ecommerce",
		Portfolio => "portfolio",
	}
}

/// Technology choices for the generated repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechStack {
	pub frontend: Frontend,
	pub backend: Backend,
	pub database: Database,
}

/// Styling choices for the generated application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylePreferences {
	pub theme: Theme,
	pub color_scheme: ColorScheme,
	pub layout: Layout,
}

/// Body of `POST /generator/generate/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
	pub description: String,
	#[serde(default)]
	pub features: Vec<String>,
	pub tech_stack: TechStack,
	pub style_preferences: StylePreferences,
}
