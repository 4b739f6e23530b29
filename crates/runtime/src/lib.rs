//! Progress channel runtime for webforge.
//!
//! Connects to the backend's per-project progress feed over a WebSocket (or a
//! polling fallback), announces the project, and turns inbound frames into
//! typed [`ChannelEvent`]s.

pub mod channel;
pub mod connector;
pub mod error;
pub mod fake_transport;
pub mod polling;
pub mod transport;
pub mod websocket;

pub use channel::{Channel, ChannelEvent, ChannelHandle, ChannelHandler};
pub use connector::{ChannelConnector, DEFAULT_POLL_INTERVAL, EndpointConnector};
pub use error::{Error, Result};
pub use fake_transport::{FakeConnector, FakeTransportBuilder, FakeTransportController};
pub use polling::PollingTransport;
pub use transport::{Transport, TransportKind, TransportParts, TransportReceiver};
pub use websocket::WebSocketTransport;
