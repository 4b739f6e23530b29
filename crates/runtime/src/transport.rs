//! Transport abstraction beneath the progress channel.
//!
//! A transport is split into a [`Transport`] half that writes frames and a
//! [`TransportReceiver`] half whose `run` future pushes every inbound frame
//! into an unbounded queue until the connection ends.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::sync::mpsc;

use crate::error::Result;

/// Outbound half of a connection.
pub trait Transport: Send {
	fn send(&mut self, message: JsonValue) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Inbound half of a connection.
///
/// `run` resolves when the remote side closes (`Ok`) or the connection
/// fails (`Err`). Dropping the future releases the connection.
pub trait TransportReceiver: Send {
	fn run(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>;
}

/// Both halves of a connected transport plus the queue the receiver feeds.
pub struct TransportParts {
	pub sender: Box<dyn Transport>,
	pub receiver: Box<dyn TransportReceiver>,
	pub message_rx: mpsc::UnboundedReceiver<JsonValue>,
}

impl fmt::Debug for TransportParts {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TransportParts").finish_non_exhaustive()
	}
}

/// Transport modes, tried in configured order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
	/// Streaming frames over a WebSocket.
	#[serde(alias = "ws")]
	WebSocket,
	/// Periodic polling of the project detail endpoint.
	Polling,
}

impl TransportKind {
	pub const DEFAULT_ORDER: [TransportKind; 2] = [TransportKind::WebSocket, TransportKind::Polling];

	pub fn as_str(self) -> &'static str {
		match self {
			TransportKind::WebSocket => "websocket",
			TransportKind::Polling => "polling",
		}
	}
}

impl fmt::Display for TransportKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for TransportKind {
	type Err = String;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s.trim().to_lowercase().as_str() {
			"websocket" | "ws" => Ok(TransportKind::WebSocket),
			"polling" => Ok(TransportKind::Polling),
			_ => Err(format!("unknown transport: {s}")),
		}
	}
}
