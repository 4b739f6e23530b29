//! Endpoint resolution and transport fallback.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{info, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::polling::PollingTransport;
use crate::transport::{TransportKind, TransportParts};
use crate::websocket::WebSocketTransport;

/// Default interval between polls when the polling transport is active.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Opens a transport scoped to one project.
pub trait ChannelConnector: Send + Sync {
	fn connect<'a>(&'a self, project_id: &'a str) -> Pin<Box<dyn Future<Output = Result<TransportParts>> + Send + 'a>>;
}

/// Connects to the configured backend, falling back through `transports` in order.
#[derive(Debug, Clone)]
pub struct EndpointConnector {
	ws_url: Url,
	api_url: Url,
	transports: Vec<TransportKind>,
	poll_interval: Duration,
	http: reqwest::Client,
}

impl EndpointConnector {
	/// Creates a connector using the default transport order.
	///
	/// `http` is reused by the polling transport so that it carries the same
	/// session cookies as the API client.
	pub fn new(ws_url: Url, api_url: Url, http: reqwest::Client) -> Self {
		Self {
			ws_url,
			api_url,
			transports: TransportKind::DEFAULT_ORDER.to_vec(),
			poll_interval: DEFAULT_POLL_INTERVAL,
			http,
		}
	}

	pub fn with_transports(mut self, transports: Vec<TransportKind>) -> Self {
		self.transports = transports;
		self
	}

	pub fn with_poll_interval(mut self, interval: Duration) -> Self {
		self.poll_interval = interval;
		self
	}

	pub fn transports(&self) -> &[TransportKind] {
		&self.transports
	}

	/// WebSocket URL with the project id attached as a query parameter.
	pub fn channel_url(&self, project_id: &str) -> Url {
		let mut url = self.ws_url.clone();
		url.query_pairs_mut().append_pair("projectId", project_id);
		url
	}

	/// Project detail URL polled by the fallback transport.
	pub fn project_url(&self, project_id: &str) -> String {
		let mut url = self.api_url.clone();
		if let Ok(mut segments) = url.path_segments_mut() {
			segments.pop_if_empty().extend(["generator", "projects", project_id, ""]);
		}
		url.into()
	}
}

impl ChannelConnector for EndpointConnector {
	fn connect<'a>(&'a self, project_id: &'a str) -> Pin<Box<dyn Future<Output = Result<TransportParts>> + Send + 'a>> {
		Box::pin(async move {
			let mut last_error = None;

			for kind in &self.transports {
				match kind {
					TransportKind::WebSocket => {
						let url = self.channel_url(project_id);
						match WebSocketTransport::connect(url.as_str()).await {
							Ok((transport, message_rx)) => {
								info!(target = "webforge.channel", %project_id, transport = %kind, "channel connected");
								return Ok(transport.into_transport_parts(message_rx));
							}
							Err(err) => {
								warn!(target = "webforge.channel", %project_id, %url, error = %err, "websocket connect failed");
								last_error = Some(err);
							}
						}
					}
					TransportKind::Polling => {
						let url = self.project_url(project_id);
						info!(target = "webforge.channel", %project_id, %url, interval_ms = self.poll_interval.as_millis() as u64, "channel polling");
						return Ok(PollingTransport::connect(self.http.clone(), url, self.poll_interval));
					}
				}
			}

			Err(last_error.unwrap_or(Error::NoTransport))
		})
	}
}
