//! WebSocket transport built on `tokio-tungstenite`.

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value as JsonValue;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};

use crate::error::Result;
use crate::transport::{Transport, TransportParts, TransportReceiver};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A connected WebSocket carrying JSON text frames.
pub struct WebSocketTransport {
	sink: SplitSink<WsStream, Message>,
	stream: SplitStream<WsStream>,
	message_tx: mpsc::UnboundedSender<JsonValue>,
}

impl WebSocketTransport {
	/// Performs the handshake against `url`.
	///
	/// Returns the transport and the queue that inbound frames are pushed into
	/// once the receiver half runs.
	pub async fn connect(url: &str) -> Result<(Self, mpsc::UnboundedReceiver<JsonValue>)> {
		let (socket, response) = connect_async(url).await?;
		debug!(target = "webforge.channel", %url, status = %response.status(), "websocket handshake complete");

		let (sink, stream) = socket.split();
		let (message_tx, message_rx) = mpsc::unbounded_channel();
		Ok((Self { sink, stream, message_tx }, message_rx))
	}

	pub fn into_transport_parts(self, message_rx: mpsc::UnboundedReceiver<JsonValue>) -> TransportParts {
		TransportParts {
			sender: Box::new(WebSocketSender { sink: self.sink }),
			receiver: Box::new(WebSocketReceiver {
				stream: self.stream,
				message_tx: self.message_tx,
			}),
			message_rx,
		}
	}
}

struct WebSocketSender {
	sink: SplitSink<WsStream, Message>,
}

impl Transport for WebSocketSender {
	fn send(&mut self, message: JsonValue) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
		Box::pin(async move {
			let text = serde_json::to_string(&message)?;
			self.sink.send(Message::Text(text.into())).await?;
			Ok(())
		})
	}
}

struct WebSocketReceiver {
	stream: SplitStream<WsStream>,
	message_tx: mpsc::UnboundedSender<JsonValue>,
}

impl TransportReceiver for WebSocketReceiver {
	fn run(mut self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
		Box::pin(async move {
			while let Some(frame) = self.stream.next().await {
				match frame? {
					Message::Text(text) => match serde_json::from_str::<JsonValue>(&text) {
						Ok(value) => {
							if self.message_tx.send(value).is_err() {
								break;
							}
						}
						Err(err) => {
							warn!(target = "webforge.channel", error = %err, "dropping non-JSON text frame");
						}
					},
					Message::Close(frame) => {
						debug!(target = "webforge.channel", ?frame, "server closed websocket");
						break;
					}
					Message::Binary(bytes) => {
						debug!(target = "webforge.channel", len = bytes.len(), "ignoring binary frame");
					}
					_ => {}
				}
			}
			Ok(())
		})
	}
}
