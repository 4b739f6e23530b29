//! Polling fallback transport.
//!
//! Periodically fetches the project detail resource and synthesizes the same
//! frames the WebSocket would have delivered: one `generation_status` per new
//! log entry (or per status/progress change when no entry arrived), then a
//! terminal `generation_complete` or `generation_error`.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde_json::{Map, Value as JsonValue, json};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::transport::{Transport, TransportParts, TransportReceiver};

pub struct PollingTransport;

impl PollingTransport {
	/// Builds a polling transport for `project_url`. No request is made until the receiver runs.
	pub fn connect(client: reqwest::Client, project_url: String, interval: Duration) -> TransportParts {
		let (message_tx, message_rx) = mpsc::unbounded_channel();
		TransportParts {
			sender: Box::new(PollingSender),
			receiver: Box::new(PollingReceiver {
				client,
				project_url,
				interval,
				message_tx,
			}),
			message_rx,
		}
	}
}

struct PollingSender;

impl Transport for PollingSender {
	fn send(&mut self, message: JsonValue) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
		Box::pin(async move {
			trace!(target = "webforge.channel", %message, "polling transport has no upstream; frame dropped");
			Ok(())
		})
	}
}

struct PollingReceiver {
	client: reqwest::Client,
	project_url: String,
	interval: Duration,
	message_tx: mpsc::UnboundedSender<JsonValue>,
}

impl TransportReceiver for PollingReceiver {
	fn run(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
		Box::pin(async move {
			let mut ticker = tokio::time::interval(self.interval);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
			let mut state = PollState::default();

			loop {
				ticker.tick().await;

				let response = self.client.get(&self.project_url).send().await?;
				let status = response.status();
				if !status.is_success() {
					return Err(Error::Transport(format!("project poll returned {status}")));
				}
				let project: JsonValue = response.json().await?;

				let observation = state.observe(&project);
				for frame in observation.frames {
					if self.message_tx.send(frame).is_err() {
						return Ok(());
					}
				}
				if observation.finished {
					debug!(target = "webforge.channel", url = %self.project_url, "project reached a terminal status; polling stopped");
					return Ok(());
				}
			}
		})
	}
}

/// Frames produced by one poll.
#[derive(Debug, Default, PartialEq)]
pub struct Observation {
	pub frames: Vec<JsonValue>,
	pub finished: bool,
}

/// Remembers what earlier polls already reported.
#[derive(Debug, Default)]
pub struct PollState {
	logs_seen: usize,
	last_status: Option<String>,
	last_progress: Option<f64>,
}

impl PollState {
	/// Diffs a project detail document against the previous poll.
	pub fn observe(&mut self, project: &JsonValue) -> Observation {
		let status = project.get("status").and_then(JsonValue::as_str).map(str::to_string);
		let progress = project.get("progress").and_then(JsonValue::as_f64);
		let logs = project.get("logs").and_then(JsonValue::as_array).map(Vec::as_slice).unwrap_or_default();

		// Terminal outcomes travel only in the complete/error frame pushed last.
		let phase = status.as_deref().filter(|status| !matches!(*status, "completed" | "failed"));

		let mut frames = Vec::new();
		let fresh_logs = logs.get(self.logs_seen..).unwrap_or_default();
		for entry in fresh_logs {
			let mut frame = status_frame(phase, progress);
			frame.insert("message".to_string(), entry.get("message").cloned().unwrap_or(JsonValue::Null));
			if let Some(kind) = entry.get("log_type").and_then(JsonValue::as_str) {
				frame.insert("msg_type".to_string(), json!(kind));
			}
			frames.push(JsonValue::Object(frame));
		}
		self.logs_seen = self.logs_seen.max(logs.len());

		let changed = status != self.last_status || progress != self.last_progress;
		if fresh_logs.is_empty() && changed {
			frames.push(JsonValue::Object(status_frame(phase, progress)));
		}
		self.last_status = status.clone();
		self.last_progress = progress;

		let finished = match status.as_deref() {
			Some("completed") => {
				let mut fields = project.as_object().cloned().unwrap_or_default();
				fields.remove("logs");
				fields.insert("type".to_string(), json!("generation_complete"));
				frames.push(JsonValue::Object(fields));
				true
			}
			Some("failed") => {
				let mut frame = Map::new();
				frame.insert("type".to_string(), json!("generation_error"));
				if let Some(message) = project.get("error_message").filter(|message| message.is_string()) {
					frame.insert("message".to_string(), message.clone());
				}
				frames.push(JsonValue::Object(frame));
				true
			}
			_ => false,
		};

		Observation { frames, finished }
	}
}

fn status_frame(status: Option<&str>, progress: Option<f64>) -> Map<String, JsonValue> {
	let mut frame = Map::new();
	frame.insert("type".to_string(), json!("generation_status"));
	if let Some(status) = status {
		frame.insert("status".to_string(), json!(status));
	}
	if let Some(progress) = progress {
		frame.insert("progress".to_string(), json!(progress));
	}
	frame
}
