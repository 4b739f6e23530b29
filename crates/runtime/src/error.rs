use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	#[error("Invalid project id: channel requires a non-empty id")]
	InvalidProjectId,

	#[error("Transport error: {0}")]
	Transport(String),

	#[error("WebSocket error: {0}")]
	WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),

	#[error("Serialization error: {0}")]
	Serde(#[from] serde_json::Error),

	#[error("No transport configured")]
	NoTransport,
}
