//! In-memory transport and connector for tests.
//!
//! # Example
//!
//! ```ignore
//! let connector = Arc::new(FakeConnector::new());
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! let handle = Channel::open(connector.clone(), "p-1", tx)?;
//!
//! let controller = connector.wait_for("p-1").await;
//! controller.inject_status(json!({"status": "planning", "progress": 25}));
//! let event = rx.recv().await;
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Value as JsonValue, json};
use tokio::sync::mpsc;

use crate::connector::ChannelConnector;
use crate::error::{Error, Result};
use crate::transport::{Transport, TransportParts, TransportReceiver};

/// Builder for creating fake transport instances.
#[derive(Default)]
pub struct FakeTransportBuilder {}

impl FakeTransportBuilder {
	pub fn new() -> Self {
		Self {}
	}

	/// Build the fake transport and return both parts and a controller.
	pub fn build(self) -> (TransportParts, FakeTransportController) {
		let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
		let (message_tx, message_rx) = mpsc::unbounded_channel();
		let sent = Arc::new(Mutex::new(Vec::new()));
		let released = Arc::new(AtomicBool::new(false));

		let sender = FakeTransportSender {
			sent: Arc::clone(&sent),
			released: Arc::clone(&released),
		};

		let receiver = FakeTransportReceiver { inbound_rx, message_tx };

		let controller = FakeTransportController {
			inbound_tx: Mutex::new(Some(inbound_tx)),
			sent,
			released,
		};

		let parts = TransportParts {
			sender: Box::new(sender),
			receiver: Box::new(receiver),
			message_rx,
		};

		(parts, controller)
	}
}

/// Injects inbound frames and inspects outbound ones.
pub struct FakeTransportController {
	inbound_tx: Mutex<Option<mpsc::UnboundedSender<JsonValue>>>,
	sent: Arc<Mutex<Vec<JsonValue>>>,
	released: Arc<AtomicBool>,
}

impl FakeTransportController {
	/// Inject a raw JSON frame as if the server had sent it.
	pub fn inject(&self, frame: JsonValue) {
		if let Some(tx) = self.inbound_tx.lock().as_ref() {
			let _ = tx.send(frame);
		}
	}

	/// Inject a `generation_status` frame with the given body fields.
	pub fn inject_status(&self, body: JsonValue) {
		self.inject(tagged("generation_status", body));
	}

	/// Inject a `generation_complete` frame with the given project fields.
	pub fn inject_complete(&self, body: JsonValue) {
		self.inject(tagged("generation_complete", body));
	}

	/// Inject a `generation_error` frame.
	pub fn inject_error(&self, message: &str) {
		self.inject(json!({"type": "generation_error", "error": message}));
	}

	/// Simulate the server closing the connection.
	pub fn disconnect(&self) {
		self.inbound_tx.lock().take();
	}

	/// Take all frames the client sent, clearing the buffer.
	pub fn take_sent(&self) -> Vec<JsonValue> {
		std::mem::take(&mut *self.sent.lock())
	}

	/// `true` once the client side of the transport has been dropped.
	pub fn is_released(&self) -> bool {
		self.released.load(Ordering::SeqCst)
	}

	/// Waits up to one second for the client to release the transport.
	pub async fn wait_released(&self) -> bool {
		for _ in 0..100 {
			if self.is_released() {
				return true;
			}
			tokio::time::sleep(Duration::from_millis(10)).await;
		}
		self.is_released()
	}

	/// Waits up to one second for the client to have sent `count` frames.
	pub async fn wait_sent(&self, count: usize) -> Vec<JsonValue> {
		for _ in 0..100 {
			if self.sent.lock().len() >= count {
				break;
			}
			tokio::time::sleep(Duration::from_millis(10)).await;
		}
		self.sent.lock().clone()
	}
}

fn tagged(kind: &str, body: JsonValue) -> JsonValue {
	let mut frame = match body {
		JsonValue::Object(map) => map,
		_ => serde_json::Map::new(),
	};
	frame.insert("type".to_string(), json!(kind));
	JsonValue::Object(frame)
}

struct FakeTransportSender {
	sent: Arc<Mutex<Vec<JsonValue>>>,
	released: Arc<AtomicBool>,
}

impl Transport for FakeTransportSender {
	fn send(&mut self, message: JsonValue) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
		let sent = Arc::clone(&self.sent);
		Box::pin(async move {
			sent.lock().push(message);
			Ok(())
		})
	}
}

impl Drop for FakeTransportSender {
	fn drop(&mut self) {
		self.released.store(true, Ordering::SeqCst);
	}
}

struct FakeTransportReceiver {
	inbound_rx: mpsc::UnboundedReceiver<JsonValue>,
	message_tx: mpsc::UnboundedSender<JsonValue>,
}

impl TransportReceiver for FakeTransportReceiver {
	fn run(mut self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
		Box::pin(async move {
			while let Some(message) = self.inbound_rx.recv().await {
				if self.message_tx.send(message).is_err() {
					break;
				}
			}
			Ok(())
		})
	}
}

/// Connector handing out fake transports, one per `connect` call.
#[derive(Default)]
pub struct FakeConnector {
	connections: Mutex<Vec<(String, Arc<FakeTransportController>)>>,
	failure: Mutex<Option<String>>,
}

impl FakeConnector {
	pub fn new() -> Self {
		Self::default()
	}

	/// Makes the next `connect` call fail with `message`.
	pub fn fail_next(&self, message: impl Into<String>) {
		*self.failure.lock() = Some(message.into());
	}

	/// Project ids passed to `connect`, in call order.
	pub fn connected_ids(&self) -> Vec<String> {
		self.connections.lock().iter().map(|(id, _)| id.clone()).collect()
	}

	/// Controllers of every transport handed out, in call order.
	pub fn controllers(&self) -> Vec<Arc<FakeTransportController>> {
		self.connections.lock().iter().map(|(_, controller)| Arc::clone(controller)).collect()
	}

	/// Latest controller for `project_id`, if connected.
	pub fn controller(&self, project_id: &str) -> Option<Arc<FakeTransportController>> {
		self.connections
			.lock()
			.iter()
			.rev()
			.find(|(id, _)| id == project_id)
			.map(|(_, controller)| Arc::clone(controller))
	}

	/// Waits up to one second for a connection to `project_id`.
	///
	/// # Panics
	///
	/// Panics when no connection shows up in time.
	pub async fn wait_for(&self, project_id: &str) -> Arc<FakeTransportController> {
		for _ in 0..100 {
			if let Some(controller) = self.controller(project_id) {
				return controller;
			}
			tokio::time::sleep(Duration::from_millis(10)).await;
		}
		panic!("no fake connection for project {project_id}");
	}
}

impl ChannelConnector for FakeConnector {
	fn connect<'a>(&'a self, project_id: &'a str) -> Pin<Box<dyn Future<Output = Result<TransportParts>> + Send + 'a>> {
		Box::pin(async move {
			if let Some(message) = self.failure.lock().take() {
				return Err(Error::Transport(message));
			}
			let (parts, controller) = FakeTransportBuilder::new().build();
			self.connections.lock().push((project_id.to_string(), Arc::new(controller)));
			Ok(parts)
		})
	}
}
