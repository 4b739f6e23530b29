use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use webforge_protocol::{ProjectDescriptor, StylePreferences, TechStack};

/// Number of wizard steps a session starts with.
pub const DEFAULT_TOTAL_STEPS: u32 = 5;

/// Outcome-level state of a generation attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
	#[default]
	Idle,
	Starting,
	Generating,
	Completed,
	Failed,
}

impl GenerationStatus {
	pub fn is_terminal(self) -> bool {
		matches!(self, GenerationStatus::Completed | GenerationStatus::Failed)
	}

	/// `true` while a start request or its channel is still running.
	pub fn is_in_flight(self) -> bool {
		matches!(self, GenerationStatus::Starting | GenerationStatus::Generating)
	}

	/// Position in the forward-only order of one attempt.
	pub fn rank(self) -> u8 {
		match self {
			GenerationStatus::Idle => 0,
			GenerationStatus::Starting => 1,
			GenerationStatus::Generating => 2,
			GenerationStatus::Completed | GenerationStatus::Failed => 3,
		}
	}

	/// Maps a backend status string. Pipeline phases such as `analyzing`
	/// or `packaging` are all [`GenerationStatus::Generating`].
	pub fn from_wire(status: &str) -> Self {
		match status.trim().to_ascii_lowercase().as_str() {
			"idle" => GenerationStatus::Idle,
			"starting" | "pending" => GenerationStatus::Starting,
			"completed" => GenerationStatus::Completed,
			"failed" => GenerationStatus::Failed,
			_ => GenerationStatus::Generating,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			GenerationStatus::Idle => "idle",
			GenerationStatus::Starting => "starting",
			GenerationStatus::Generating => "generating",
			GenerationStatus::Completed => "completed",
			GenerationStatus::Failed => "failed",
		}
	}
}

impl fmt::Display for GenerationStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Severity of a message log entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
	#[default]
	Info,
	Success,
	Warning,
	Error,
}

impl MessageKind {
	/// Unknown or missing kinds are [`MessageKind::Info`].
	pub fn from_wire(kind: Option<&str>) -> Self {
		match kind.map(|kind| kind.trim().to_ascii_lowercase()).as_deref() {
			Some("success") => MessageKind::Success,
			Some("warning") | Some("warn") => MessageKind::Warning,
			Some("error") => MessageKind::Error,
			_ => MessageKind::Info,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			MessageKind::Info => "info",
			MessageKind::Success => "success",
			MessageKind::Warning => "warning",
			MessageKind::Error => "error",
		}
	}
}

impl fmt::Display for MessageKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One entry of the session's message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
	pub timestamp: DateTime<Utc>,
	pub message: String,
	#[serde(rename = "type")]
	pub kind: MessageKind,
}

impl StatusMessage {
	pub fn new(message: impl Into<String>, kind: MessageKind) -> Self {
		Self {
			timestamp: Utc::now(),
			message: message.into(),
			kind,
		}
	}
}

/// Point-in-time copy of a session, published to subscribers after every change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
	pub step: u32,
	pub total_steps: u32,
	pub description: String,
	pub features: Vec<String>,
	pub tech_stack: TechStack,
	pub style_preferences: StylePreferences,
	pub status: GenerationStatus,
	/// Raw backend pipeline phase from the latest status event.
	pub phase: Option<String>,
	pub progress: u8,
	pub messages: Vec<StatusMessage>,
	pub project: Option<ProjectDescriptor>,
	pub channel_open: bool,
}

impl SessionSnapshot {
	pub(crate) fn initial(total_steps: u32) -> Self {
		Self {
			step: 1,
			total_steps,
			description: String::new(),
			features: Vec::new(),
			tech_stack: TechStack::default(),
			style_preferences: StylePreferences::default(),
			status: GenerationStatus::Idle,
			phase: None,
			progress: 0,
			messages: Vec::new(),
			project: None,
			channel_open: false,
		}
	}
}
