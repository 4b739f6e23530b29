use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	#[error("API request failed ({status}): {message}")]
	Api { status: u16, message: String },

	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),

	#[error("Configuration error: {0}")]
	Config(String),

	#[error("A generation is already {status}; disconnect or wait for it to finish")]
	GenerationInFlight { status: String },

	#[error("Channel error: {0}")]
	Channel(#[from] webforge_runtime::Error),

	#[error("Serialization error: {0}")]
	Serde(#[from] serde_json::Error),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl Error {
	/// HTTP status for API rejections.
	pub fn status(&self) -> Option<u16> {
		match self {
			Error::Api { status, .. } => Some(*status),
			Error::Http(err) => err.status().map(|status| status.as_u16()),
			_ => None,
		}
	}
}
