//! Project-scoped progress channel.
//!
//! [`Channel::open`] spawns a task that connects through a
//! [`ChannelConnector`], announces the project with a `join` frame, and then
//! decodes every inbound frame into a [`ChannelEvent`] handed to the caller's
//! [`ChannelHandler`] in arrival order.
//!
//! # Message Flow
//!
//! 1. Owner calls `Channel::open(connector, project_id, handler)` and keeps the [`ChannelHandle`]
//! 2. Task connects (WebSocket first, polling as configured fallback)
//! 3. Task sends `{"type": "join", "projectId": ...}`
//! 4. Transport receiver pushes raw frames into the task's queue
//! 5. Task decodes each frame and forwards status/complete/error events
//! 6. Connection loss is reported once as [`ChannelEvent::Disconnected`]
//! 7. `ChannelHandle::close` (or drop) stops the task and releases the transport
//!
//! Malformed frames and unknown frame kinds are logged and dropped. Connect
//! and transport failures reach the handler as [`ChannelEvent::Error`].

use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use webforge_protocol::{ClientMessage, ErrorNotice, ServerMessage, StatusUpdate};

use crate::connector::ChannelConnector;
use crate::error::{Error, Result};
use crate::transport::TransportParts;

/// Typed inbound event delivered to a [`ChannelHandler`].
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
	/// Progress update.
	Status(StatusUpdate),
	/// Terminal success with the completed project's fields.
	Complete(Map<String, JsonValue>),
	/// Domain failure reported by the backend, or a connect/transport failure.
	Error(ErrorNotice),
	/// The connection ended. Never followed by further events.
	Disconnected { reason: Option<String> },
}

/// Receives channel events, one at a time, in arrival order.
pub trait ChannelHandler: Send + Sync + 'static {
	fn handle(&self, event: ChannelEvent);
}

impl ChannelHandler for mpsc::UnboundedSender<ChannelEvent> {
	fn handle(&self, event: ChannelEvent) {
		let _ = self.send(event);
	}
}

pub struct Channel;

impl Channel {
	/// Opens a channel for `project_id` and starts delivering events to `handler`.
	///
	/// Must be called from within a Tokio runtime. Connection happens in the
	/// background; the only synchronous failure is an empty project id.
	pub fn open<H: ChannelHandler>(connector: Arc<dyn ChannelConnector>, project_id: &str, handler: H) -> Result<ChannelHandle> {
		let project_id = project_id.trim();
		if project_id.is_empty() {
			return Err(Error::InvalidProjectId);
		}

		let (shutdown_tx, shutdown_rx) = oneshot::channel();
		let task = tokio::spawn(run_channel(connector, project_id.to_string(), handler, shutdown_rx));

		Ok(ChannelHandle {
			project_id: project_id.to_string(),
			shutdown: Some(shutdown_tx),
			task: Some(task),
		})
	}
}

/// Exclusive handle to an open channel. Closing is idempotent and also happens on drop.
#[derive(Debug)]
pub struct ChannelHandle {
	project_id: String,
	shutdown: Option<oneshot::Sender<()>>,
	task: Option<JoinHandle<()>>,
}

impl ChannelHandle {
	pub fn project_id(&self) -> &str {
		&self.project_id
	}

	/// `true` until the handle is closed or the connection has ended.
	pub fn is_open(&self) -> bool {
		self.task.as_ref().is_some_and(|task| !task.is_finished())
	}

	/// Stops event delivery and releases the underlying transport.
	pub fn close(&mut self) {
		let Some(shutdown) = self.shutdown.take() else {
			return;
		};
		let _ = shutdown.send(());
		self.task.take();
		debug!(target = "webforge.channel", project_id = %self.project_id, "channel close requested");
	}
}

impl Drop for ChannelHandle {
	fn drop(&mut self) {
		self.close();
	}
}

async fn run_channel<H: ChannelHandler>(connector: Arc<dyn ChannelConnector>, project_id: String, handler: H, shutdown: oneshot::Receiver<()>) {
	tokio::select! {
		_ = shutdown => {
			info!(target = "webforge.channel", %project_id, "channel closed");
		}
		_ = pump(connector.as_ref(), &project_id, &handler) => {}
	}
}

async fn pump<H: ChannelHandler>(connector: &dyn ChannelConnector, project_id: &str, handler: &H) {
	let parts = match connector.connect(project_id).await {
		Ok(parts) => parts,
		Err(err) => {
			warn!(target = "webforge.channel", %project_id, error = %err, "channel connect failed");
			handler.handle(ChannelEvent::Error(ErrorNotice::new(err.to_string())));
			handler.handle(ChannelEvent::Disconnected {
				reason: Some(err.to_string()),
			});
			return;
		}
	};

	let TransportParts {
		mut sender,
		receiver,
		mut message_rx,
	} = parts;

	let join = ClientMessage::Join {
		project_id: project_id.to_string(),
	};
	match serde_json::to_value(&join) {
		Ok(frame) => {
			if let Err(err) = sender.send(frame).await {
				warn!(target = "webforge.channel", %project_id, error = %err, "join announcement failed");
				handler.handle(ChannelEvent::Error(ErrorNotice::new(err.to_string())));
			} else {
				debug!(target = "webforge.channel", %project_id, "join sent");
			}
		}
		Err(err) => warn!(target = "webforge.channel", error = %err, "failed to encode join frame"),
	}

	let receive = receiver.run();
	tokio::pin!(receive);
	let mut receiving = true;
	let mut transport_error = None;

	loop {
		tokio::select! {
			biased;

			frame = message_rx.recv() => match frame {
				Some(frame) => dispatch(project_id, handler, frame),
				None => break,
			},
			result = &mut receive, if receiving => {
				receiving = false;
				if let Err(err) = result {
					transport_error = Some(err);
				}
			}
		}
	}

	let reason = match transport_error {
		Some(err) => {
			warn!(target = "webforge.channel", %project_id, error = %err, "channel transport error");
			handler.handle(ChannelEvent::Error(ErrorNotice::new(err.to_string())));
			Some(err.to_string())
		}
		None => None,
	};
	info!(target = "webforge.channel", %project_id, "channel disconnected");
	handler.handle(ChannelEvent::Disconnected { reason });
}

fn dispatch<H: ChannelHandler>(project_id: &str, handler: &H, frame: JsonValue) {
	match ServerMessage::parse(frame) {
		Ok(Some(ServerMessage::GenerationStatus(update))) => handler.handle(ChannelEvent::Status(update)),
		Ok(Some(ServerMessage::GenerationComplete(fields))) => handler.handle(ChannelEvent::Complete(fields)),
		Ok(Some(ServerMessage::GenerationError(notice))) => handler.handle(ChannelEvent::Error(notice)),
		Ok(Some(ServerMessage::Connected { project_id: acknowledged })) => {
			debug!(target = "webforge.channel", %project_id, ?acknowledged, "join acknowledged");
		}
		Ok(None) => debug!(target = "webforge.channel", %project_id, "ignoring unknown frame"),
		Err(err) => warn!(target = "webforge.channel", %project_id, error = %err, "dropping malformed frame"),
	}
}
