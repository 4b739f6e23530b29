//! Frames carried on the per-project progress channel.
//!
//! Every frame is a JSON object tagged by `type`:
//!
//! ```json
//! {"type": "join", "projectId": "5b0c..."}
//! {"type": "generation_status", "status": "planning", "progress": 25, "message": "Planning project architecture...", "msg_type": "info"}
//! {"type": "generation_complete", "project_id": "5b0c...", "github_url": "https://github.com/...", "files_count": 42}
//! {"type": "generation_error", "error": "quota exceeded"}
//! ```
//!
//! The per-message severity travels in `msg_type` because `type` is taken by
//! the envelope tag.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Fallback text for error frames that carry no message.
pub const DEFAULT_ERROR_MESSAGE: &str = "Generation failed";

/// Client-to-server frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
	/// Announces interest in a project's progress events.
	Join {
		#[serde(rename = "projectId")]
		project_id: String,
	},
}

/// Server-to-client frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
	GenerationStatus(StatusUpdate),
	GenerationComplete(Map<String, Value>),
	GenerationError(ErrorNotice),
	/// Acknowledges a `join`.
	Connected {
		#[serde(default)]
		project_id: Option<String>,
	},
}

impl ServerMessage {
	/// Envelope tags this client understands.
	pub const KINDS: &'static [&'static str] = &["generation_status", "generation_complete", "generation_error", "connected"];

	/// Decodes a raw frame.
	///
	/// Returns `Ok(None)` for frames whose `type` is missing or unknown, and an
	/// error only when a known frame kind has a malformed body.
	pub fn parse(frame: Value) -> Result<Option<Self>, serde_json::Error> {
		let known = frame
			.get("type")
			.and_then(Value::as_str)
			.is_some_and(|kind| Self::KINDS.contains(&kind));
		if !known {
			return Ok(None);
		}
		serde_json::from_value(frame).map(Some)
	}
}

/// Body of a `generation_status` frame.
///
/// Fields of the wrong type decode as absent instead of rejecting the frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
	#[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
	pub status: Option<String>,
	#[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
	pub progress: Option<f64>,
	#[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	#[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
	pub msg_type: Option<String>,
}

impl StatusUpdate {
	/// Progress as a whole percentage, clamped to `0..=100`.
	pub fn progress_percent(&self) -> Option<u8> {
		self.progress
			.filter(|value| value.is_finite())
			.map(|value| value.round().clamp(0.0, 100.0) as u8)
	}
}

/// Body of a `generation_error` frame.
///
/// The backend names the field `error`; older producers use `message`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNotice {
	#[serde(default, alias = "error", deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
}

impl ErrorNotice {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: Some(message.into()),
		}
	}

	/// The carried message, or [`DEFAULT_ERROR_MESSAGE`] when absent or blank.
	pub fn message_or_default(&self) -> &str {
		self.message
			.as_deref()
			.filter(|message| !message.trim().is_empty())
			.unwrap_or(DEFAULT_ERROR_MESSAGE)
	}
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
	D: Deserializer<'de>,
	T: DeserializeOwned,
{
	let value = Option::<Value>::deserialize(deserializer)?;
	Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

/// Accepts numbers and numeric strings such as `"50"`.
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
	let value = Option::<Value>::deserialize(deserializer)?;
	Ok(match value {
		Some(Value::Number(number)) => number.as_f64(),
		Some(Value::String(text)) => text.trim().parse().ok(),
		_ => None,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn join_uses_camel_case_project_id() {
		let frame = serde_json::to_value(ClientMessage::Join {
			project_id: "p-1".to_string(),
		})
		.unwrap();
		assert_eq!(frame, json!({"type": "join", "projectId": "p-1"}));
	}

	#[test]
	fn status_frame_with_only_progress() {
		let message = ServerMessage::parse(json!({"type": "generation_status", "progress": 30})).unwrap();
		let Some(ServerMessage::GenerationStatus(update)) = message else {
			panic!("expected status frame, got {message:?}");
		};
		assert_eq!(update.status, None);
		assert_eq!(update.progress_percent(), Some(30));
		assert_eq!(update.message, None);
	}

	#[test]
	fn progress_is_clamped_and_rounded() {
		let over = StatusUpdate {
			progress: Some(140.0),
			..Default::default()
		};
		let under = StatusUpdate {
			progress: Some(-3.0),
			..Default::default()
		};
		let fractional = StatusUpdate {
			progress: Some(42.6),
			..Default::default()
		};
		assert_eq!(over.progress_percent(), Some(100));
		assert_eq!(under.progress_percent(), Some(0));
		assert_eq!(fractional.progress_percent(), Some(43));
	}

	#[test]
	fn complete_frame_keeps_project_fields() {
		let message = ServerMessage::parse(json!({
			"type": "generation_complete",
			"project_id": "p-1",
			"github_url": "https://github.com/acme/app",
		}))
		.unwrap();
		let Some(ServerMessage::GenerationComplete(fields)) = message else {
			panic!("expected complete frame, got {message:?}");
		};
		assert_eq!(fields["github_url"], "https://github.com/acme/app");
		assert!(!fields.contains_key("type"));
	}

	#[test]
	fn error_frame_accepts_backend_field_name() {
		let message = ServerMessage::parse(json!({"type": "generation_error", "error": "quota exceeded"})).unwrap();
		assert_eq!(message, Some(ServerMessage::GenerationError(ErrorNotice::new("quota exceeded"))));
	}

	#[test]
	fn error_without_message_uses_default() {
		assert_eq!(ErrorNotice::default().message_or_default(), DEFAULT_ERROR_MESSAGE);
		assert_eq!(ErrorNotice::new("  ").message_or_default(), DEFAULT_ERROR_MESSAGE);
	}

	#[test]
	fn unknown_and_untagged_frames_are_skipped() {
		assert_eq!(ServerMessage::parse(json!({"type": "debug_status", "progress": 5})).unwrap(), None);
		assert_eq!(ServerMessage::parse(json!({"progress": 5})).unwrap(), None);
		assert_eq!(ServerMessage::parse(json!("not an object")).unwrap(), None);
	}

	#[test]
	fn wrong_typed_fields_do_not_drop_the_frame() {
		let message = ServerMessage::parse(json!({
			"type": "generation_status",
			"status": "planning",
			"progress": "lots",
			"message": "Planning project architecture...",
			"msg_type": 3
		}))
		.unwrap();
		let Some(ServerMessage::GenerationStatus(update)) = message else {
			panic!("expected status frame, got {message:?}");
		};
		assert_eq!(update.status.as_deref(), Some("planning"));
		assert_eq!(update.progress, None);
		assert_eq!(update.message.as_deref(), Some("Planning project architecture..."));
		assert_eq!(update.msg_type, None);

		let error = ServerMessage::parse(json!({"type": "generation_error", "error": {"code": 7}})).unwrap();
		assert_eq!(error, Some(ServerMessage::GenerationError(ErrorNotice::default())));
	}

	#[test]
	fn numeric_string_progress_is_accepted() {
		let message = ServerMessage::parse(json!({"type": "generation_status", "progress": "50"})).unwrap();
		let Some(ServerMessage::GenerationStatus(update)) = message else {
			panic!("expected status frame, got {message:?}");
		};
		assert_eq!(update.progress_percent(), Some(50));
	}

	#[test]
	fn malformed_known_frame_is_an_error() {
		assert!(ServerMessage::parse(json!({"type": "connected", "project_id": 7})).is_err());
	}
}
