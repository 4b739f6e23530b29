//! Generation session state machine.
//!
//! A [`GenerationSession`] owns the wizard inputs, the status of the current
//! generation attempt, its ordered message log and the progress channel for
//! the project being generated.
//!
//! ```text
//! idle -> starting -> generating -> completed
//!                                \-> failed
//! ```
//!
//! `reset_wizard` returns any state to `idle`. Once `completed` or `failed`,
//! later events may still append messages but never change status or
//! progress.
//!
//! Channel events are queued per channel and applied on the session's owner
//! task through [`GenerationSession::next_update`],
//! [`GenerationSession::run_until_settled`] or
//! [`GenerationSession::drain_pending`], so no two transitions ever run
//! concurrently. [`GenerationSession::apply`] is the transition function
//! itself and can be fed events directly.

mod model;


use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use webforge_protocol::{ErrorNotice, GenerateRequest, ProjectDescriptor, StatusUpdate, StylePreferences, TechStack};
use webforge_runtime::{Channel, ChannelConnector, ChannelEvent, ChannelHandle};

pub use model::{DEFAULT_TOTAL_STEPS, GenerationStatus, MessageKind, SessionSnapshot, StatusMessage};

use crate::api::ApiClient;
use crate::error::{Error, Result};

struct ActiveChannel {
	handle: ChannelHandle,
	events: mpsc::UnboundedReceiver<ChannelEvent>,
}

/// One user's generation wizard and the run it started.
pub struct GenerationSession {
	api: Arc<dyn ApiClient>,
	connector: Arc<dyn ChannelConnector>,
	state: SessionSnapshot,
	channel: Option<ActiveChannel>,
	updates: watch::Sender<SessionSnapshot>,
}

impl GenerationSession {
	pub fn new(api: Arc<dyn ApiClient>, connector: Arc<dyn ChannelConnector>) -> Self {
		Self::with_total_steps(api, connector, DEFAULT_TOTAL_STEPS)
	}

	/// Creates a session whose wizard has `total_steps` steps (at least one).
	pub fn with_total_steps(api: Arc<dyn ApiClient>, connector: Arc<dyn ChannelConnector>, total_steps: u32) -> Self {
		let state = SessionSnapshot::initial(total_steps.max(1));
		let (updates, _) = watch::channel(state.clone());
		Self {
			api,
			connector,
			state,
			channel: None,
			updates,
		}
	}

	pub fn step(&self) -> u32 {
		self.state.step
	}

	pub fn total_steps(&self) -> u32 {
		self.state.total_steps
	}

	pub fn description(&self) -> &str {
		&self.state.description
	}

	pub fn features(&self) -> &[String] {
		&self.state.features
	}

	pub fn tech_stack(&self) -> TechStack {
		self.state.tech_stack
	}

	pub fn style_preferences(&self) -> StylePreferences {
		self.state.style_preferences
	}

	pub fn status(&self) -> GenerationStatus {
		self.state.status
	}

	pub fn phase(&self) -> Option<&str> {
		self.state.phase.as_deref()
	}

	pub fn progress(&self) -> u8 {
		self.state.progress
	}

	pub fn messages(&self) -> &[StatusMessage] {
		&self.state.messages
	}

	pub fn project(&self) -> Option<&ProjectDescriptor> {
		self.state.project.as_ref()
	}

	pub fn has_channel(&self) -> bool {
		self.channel.is_some()
	}

	/// Project id of the open channel, if any.
	pub fn channel_project_id(&self) -> Option<&str> {
		self.channel.as_ref().map(|active| active.handle.project_id())
	}

	pub fn snapshot(&self) -> SessionSnapshot {
		self.state.clone()
	}

	/// Receiver that sees a fresh snapshot after every change.
	pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
		self.updates.subscribe()
	}

	pub fn next_step(&mut self) {
		if self.state.step < self.state.total_steps {
			self.state.step += 1;
			self.publish();
		}
	}

	pub fn prev_step(&mut self) {
		if self.state.step > 1 {
			self.state.step -= 1;
			self.publish();
		}
	}

	pub fn set_description(&mut self, description: impl Into<String>) {
		self.state.description = description.into();
		self.publish();
	}

	pub fn set_features(&mut self, features: Vec<String>) {
		self.state.features = features;
		self.publish();
	}

	/// Appends `feature` unless it is blank or already listed.
	pub fn add_feature(&mut self, feature: impl Into<String>) -> bool {
		let feature = feature.into().trim().to_string();
		if feature.is_empty() || self.state.features.contains(&feature) {
			return false;
		}
		self.state.features.push(feature);
		self.publish();
		true
	}

	pub fn remove_feature(&mut self, feature: &str) -> bool {
		let before = self.state.features.len();
		self.state.features.retain(|existing| existing != feature);
		let removed = self.state.features.len() != before;
		if removed {
			self.publish();
		}
		removed
	}

	pub fn set_tech_stack(&mut self, tech_stack: TechStack) {
		self.state.tech_stack = tech_stack;
		self.publish();
	}

	pub fn set_style_preferences(&mut self, style_preferences: StylePreferences) {
		self.state.style_preferences = style_preferences;
		self.publish();
	}

	/// Returns the wizard and run state to their defaults.
	///
	/// An open channel is left open and the last project is kept; call
	/// [`disconnect_channel`](Self::disconnect_channel) first to stop
	/// receiving events.
	pub fn reset_wizard(&mut self) {
		if let Some(project_id) = self.channel_project_id() {
			warn!(target = "webforge.session", %project_id, "wizard reset while a channel is still open");
		}
		let project = self.state.project.take();
		let channel_open = self.channel.is_some();
		self.state = SessionSnapshot {
			project,
			channel_open,
			..SessionSnapshot::initial(self.state.total_steps)
		};
		debug!(target = "webforge.session", "wizard reset");
		self.publish();
	}

	/// The request body built from the current wizard inputs.
	pub fn request(&self) -> GenerateRequest {
		GenerateRequest {
			description: self.state.description.clone(),
			features: self.state.features.clone(),
			tech_stack: self.state.tech_stack,
			style_preferences: self.state.style_preferences,
		}
	}

	/// Asks the backend to generate a project and opens its progress channel.
	///
	/// Fails with [`Error::GenerationInFlight`] while a previous attempt is
	/// still generating over an open channel; a channel that has ended is
	/// released when its last event is applied. Any other leftover channel is
	/// closed first. When the request fails the session ends `failed` and the
	/// error is returned.
	pub async fn start_generation(&mut self) -> Result<ProjectDescriptor> {
		if self.state.status.is_in_flight() && self.channel.is_some() {
			warn!(target = "webforge.session", status = %self.state.status, "generation already in flight");
			return Err(Error::GenerationInFlight {
				status: self.state.status.to_string(),
			});
		}
		self.disconnect_channel();

		self.state.status = GenerationStatus::Starting;
		self.state.phase = None;
		self.state.progress = 0;
		self.state.messages.clear();
		self.publish();

		let request = self.request();
		info!(target = "webforge.session", features = request.features.len(), "starting generation");
		let project = match self.api.generate(&request).await {
			Ok(project) => project,
			Err(err) => {
				warn!(target = "webforge.session", error = %err, "generation request failed");
				self.state.status = GenerationStatus::Failed;
				self.publish();
				return Err(err);
			}
		};
		self.state.project = Some(project.clone());

		let (events_tx, events) = mpsc::unbounded_channel();
		match Channel::open(Arc::clone(&self.connector), &project.id, events_tx) {
			Ok(handle) => {
				info!(target = "webforge.session", project_id = %project.id, "progress channel opened");
				self.channel = Some(ActiveChannel { handle, events });
				self.state.channel_open = true;
				self.publish();
				Ok(project)
			}
			Err(err) => {
				warn!(target = "webforge.session", project_id = %project.id, error = %err, "progress channel could not be opened");
				self.state.status = GenerationStatus::Failed;
				self.push_message(err.to_string(), MessageKind::Error);
				self.publish();
				Err(err.into())
			}
		}
	}

	/// Applies one channel event. This is the session's transition function.
	pub fn apply(&mut self, event: ChannelEvent) {
		match event {
			ChannelEvent::Status(update) => self.apply_status(update),
			ChannelEvent::Complete(fields) => self.apply_complete(fields),
			ChannelEvent::Error(notice) => self.apply_error(notice),
			ChannelEvent::Disconnected { reason } => {
				if self.state.status.is_terminal() {
					debug!(target = "webforge.session", ?reason, "channel ended");
				} else {
					warn!(target = "webforge.session", ?reason, status = %self.state.status, "channel ended before the generation settled");
				}
				self.disconnect_channel();
				return;
			}
		}
		self.publish();
	}

	fn apply_status(&mut self, update: StatusUpdate) {
		if self.state.status.is_terminal() {
			debug!(target = "webforge.session", status = ?update.status, "status after terminal state; keeping outcome");
		} else {
			match update.status.as_deref().map(str::trim).filter(|status| !status.is_empty()) {
				Some(raw) => {
					let next = GenerationStatus::from_wire(raw);
					if next.rank() >= self.state.status.rank() {
						self.state.status = next;
					}
					if next == GenerationStatus::Completed {
						self.state.progress = 100;
					}
					self.state.phase = Some(raw.to_string());
				}
				None if self.state.status == GenerationStatus::Starting => {
					self.state.status = GenerationStatus::Generating;
				}
				None => {}
			}
			if let Some(progress) = update.progress_percent() {
				self.state.progress = self.state.progress.max(progress);
			}
		}

		if let Some(message) = update.message.filter(|message| !message.is_empty()) {
			self.push_message(message, MessageKind::from_wire(update.msg_type.as_deref()));
		}
	}

	fn apply_complete(&mut self, fields: Map<String, JsonValue>) {
		if self.state.status == GenerationStatus::Failed {
			debug!(target = "webforge.session", "completion after failure ignored");
			return;
		}
		self.state.status = GenerationStatus::Completed;
		self.state.progress = 100;
		match self.state.project.as_mut() {
			Some(project) => project.merge(fields),
			None => self.state.project = Some(ProjectDescriptor::from_fields(fields)),
		}
		info!(target = "webforge.session", project_id = ?self.state.project.as_ref().map(|project| &project.id), "generation completed");
	}

	fn apply_error(&mut self, notice: ErrorNotice) {
		let message = notice.message_or_default().to_string();
		if self.state.status.is_terminal() {
			debug!(target = "webforge.session", status = %self.state.status, "error after terminal state; logged only");
		} else {
			warn!(target = "webforge.session", error = %message, "generation failed");
			self.state.status = GenerationStatus::Failed;
		}
		self.push_message(message, MessageKind::Error);
	}

	/// Waits for the next channel event and applies it.
	///
	/// Returns `false` when no channel is open or it has delivered its last event.
	pub async fn next_update(&mut self) -> bool {
		let event = match self.channel.as_mut() {
			Some(active) => active.events.recv().await,
			None => return false,
		};
		match event {
			Some(event) => {
				self.apply(event);
				true
			}
			None => {
				self.disconnect_channel();
				false
			}
		}
	}

	/// Applies events until the run is terminal or the channel ends.
	pub async fn run_until_settled(&mut self) -> GenerationStatus {
		while !self.state.status.is_terminal() {
			if !self.next_update().await {
				break;
			}
		}
		self.state.status
	}

	/// Applies every event already queued, without waiting. Returns how many were applied.
	pub fn drain_pending(&mut self) -> usize {
		let mut applied = 0;
		loop {
			let event = match self.channel.as_mut() {
				Some(active) => active.events.try_recv(),
				None => break,
			};
			let event = match event {
				Ok(event) => event,
				Err(mpsc::error::TryRecvError::Empty) => break,
				Err(mpsc::error::TryRecvError::Disconnected) => {
					self.disconnect_channel();
					break;
				}
			};
			self.apply(event);
			applied += 1;
		}
		applied
	}

	/// Closes the progress channel, discarding events it has not delivered yet.
	///
	/// Also runs when the channel reports its end, so a lost channel never
	/// blocks the next [`start_generation`](Self::start_generation).
	pub fn disconnect_channel(&mut self) {
		let Some(mut active) = self.channel.take() else {
			return;
		};
		active.handle.close();
		info!(target = "webforge.session", project_id = %active.handle.project_id(), "progress channel disconnected");
		self.state.channel_open = false;
		self.publish();
	}

	fn push_message(&mut self, message: String, kind: MessageKind) {
		self.state.messages.push(StatusMessage::new(message, kind));
	}

	fn publish(&self) {
		self.updates.send_replace(self.state.clone());
	}
}

impl Drop for GenerationSession {
	fn drop(&mut self) {
		self.disconnect_channel();
	}
}
