use serde::{Deserialize, Serialize};

/// Current schema version for command output.
pub const SCHEMA_VERSION: u32 = 1;

/// The result envelope printed by every command in JSON mode.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	pub schema_version: u32,
	pub ok: bool,
	pub command: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub duration_ms: Option<u64>,
}

/// Error information for failed commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandError {
	pub code: ErrorCode,
	pub message: String,
}

impl CommandError {
	pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
		Self {
			code,
			message: message.into(),
		}
	}
}

impl From<webforge::Error> for CommandError {
	fn from(err: webforge::Error) -> Self {
		Self::new(ErrorCode::for_error(&err), err.to_string())
	}
}

/// Standardized error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	ConfigError,
	AuthError,
	ApiError,
	RateLimited,
	GenerationFailed,
	ChannelError,
	Interrupted,
	InternalError,
}

impl ErrorCode {
	/// Classifies a client error.
	pub fn for_error(err: &webforge::Error) -> Self {
		match err {
			webforge::Error::Config(_) => ErrorCode::ConfigError,
			webforge::Error::Channel(_) => ErrorCode::ChannelError,
			webforge::Error::GenerationInFlight { .. } => ErrorCode::GenerationFailed,
			webforge::Error::Api { .. } | webforge::Error::Http(_) => match err.status() {
				Some(401) => ErrorCode::AuthError,
				Some(403) | Some(429) => ErrorCode::RateLimited,
				_ => ErrorCode::ApiError,
			},
			_ => ErrorCode::InternalError,
		}
	}
}

impl std::fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ErrorCode::ConfigError => write!(f, "CONFIG_ERROR"),
			ErrorCode::AuthError => write!(f, "AUTH_ERROR"),
			ErrorCode::ApiError => write!(f, "API_ERROR"),
			ErrorCode::RateLimited => write!(f, "RATE_LIMITED"),
			ErrorCode::GenerationFailed => write!(f, "GENERATION_FAILED"),
			ErrorCode::ChannelError => write!(f, "CHANNEL_ERROR"),
			ErrorCode::Interrupted => write!(f, "INTERRUPTED"),
			ErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
		}
	}
}
